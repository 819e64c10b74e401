mod common;

use std::net::{IpAddr, Ipv4Addr};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use domain::base::iana::Rtype;
use domain_hosts::{Config, HostsContainer};

use common::{init_logging, wait_for, with_timeout, write_hosts};

fn v4(a: u8, b: u8, c: u8, d: u8) -> IpAddr {
    IpAddr::V4(Ipv4Addr::new(a, b, c, d))
}

/// Installs a callback counting reloads and returns the counter.
fn count_reloads(hosts: &HostsContainer) -> Arc<AtomicUsize> {
    let count = Arc::new(AtomicUsize::new(0));
    let counter = count.clone();
    hosts.set_on_changed(move || {
        counter.fetch_add(1, Ordering::SeqCst);
    });
    count
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn reloads_on_write() {
    init_logging();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("hosts");
    write_hosts(&path, "1.2.3.4 alpha\n");

    let hosts = HostsContainer::new(Config::new(&path));
    let count = count_reloads(&hosts);
    hosts.start();
    assert!(hosts.is_watching());
    assert_eq!(count.load(Ordering::SeqCst), 1);

    write_hosts(&path, "4.3.2.1 alpha\n");
    assert!(
        wait_for(Duration::from_secs(10), || {
            hosts.process("alpha", Rtype::A) == Some(vec![v4(4, 3, 2, 1)])
        })
        .await
    );
    assert!(count.load(Ordering::SeqCst) >= 2);

    with_timeout(hosts.close()).await;
    assert!(!hosts.is_watching());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn burst_of_writes_reloads_once() {
    init_logging();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("hosts");
    write_hosts(&path, "1.2.3.4 alpha\n");

    let hosts = HostsContainer::new(Config::new(&path));
    let count = count_reloads(&hosts);
    hosts.start();
    assert_eq!(count.load(Ordering::SeqCst), 1);

    for serial in 1..=10u8 {
        write_hosts(&path, &format!("10.0.0.{serial} alpha\n"));
    }
    assert!(
        wait_for(Duration::from_secs(10), || {
            count.load(Ordering::SeqCst) >= 2
        })
        .await
    );

    // Give a second reload the chance to show up.
    tokio::time::sleep(Duration::from_millis(1500)).await;
    assert_eq!(count.load(Ordering::SeqCst), 2);
    assert_eq!(
        hosts.process("alpha", Rtype::A),
        Some(vec![v4(10, 0, 0, 10)])
    );

    with_timeout(hosts.close()).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn spread_out_writes_reload_once() {
    init_logging();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("hosts");
    write_hosts(&path, "1.2.3.4 alpha\n");

    let mut conf = Config::new(&path);
    conf.set_settle_delay(Duration::from_millis(500));
    let hosts = HostsContainer::new(conf);
    let count = count_reloads(&hosts);
    hosts.start();

    // Together the writes take longer than the settle delay but the gaps
    // between them are shorter.
    for serial in 1..=10u8 {
        write_hosts(&path, &format!("10.0.0.{serial} alpha\n"));
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    assert!(
        wait_for(Duration::from_secs(10), || {
            count.load(Ordering::SeqCst) >= 2
        })
        .await
    );
    tokio::time::sleep(Duration::from_millis(1500)).await;
    assert_eq!(count.load(Ordering::SeqCst), 2);
    assert_eq!(
        hosts.process("alpha", Rtype::A),
        Some(vec![v4(10, 0, 0, 10)])
    );

    with_timeout(hosts.close()).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn new_file_in_override_dir() {
    init_logging();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("hosts");
    write_hosts(&path, "10.0.0.1 primary\n");
    let overrides = dir.path().join("hosts.d");
    std::fs::create_dir(&overrides).unwrap();

    let mut conf = Config::new(&path);
    conf.add_override_dir(&overrides);
    conf.add_override_dir(dir.path().join("missing"));
    let hosts = HostsContainer::new(conf);
    hosts.start();
    assert!(hosts.is_watching());
    assert_eq!(hosts.process("lan", Rtype::A), None);

    write_hosts(&overrides.join("dhcp"), "192.168.1.10 lan\n");
    assert!(
        wait_for(Duration::from_secs(10), || {
            hosts.process("lan", Rtype::A)
                == Some(vec![v4(192, 168, 1, 10)])
        })
        .await
    );
    assert_eq!(
        hosts.process("primary", Rtype::A),
        Some(vec![v4(10, 0, 0, 1)])
    );

    with_timeout(hosts.close()).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn static_after_close() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("hosts");
    write_hosts(&path, "1.2.3.4 alpha\n");

    let hosts = HostsContainer::new(Config::new(&path));
    let count = count_reloads(&hosts);
    hosts.start();
    with_timeout(hosts.close()).await;
    assert_eq!(count.load(Ordering::SeqCst), 1);

    write_hosts(&path, "4.3.2.1 alpha\n");
    tokio::time::sleep(Duration::from_millis(500)).await;
    assert_eq!(count.load(Ordering::SeqCst), 1);
    assert_eq!(hosts.process("alpha", Rtype::A), Some(vec![v4(1, 2, 3, 4)]));

    // Closing twice is fine.
    with_timeout(hosts.close()).await;
}
