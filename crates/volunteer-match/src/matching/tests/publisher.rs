use tokio::sync::mpsc::error::TryRecvError;

use crate::matching::domain::{Assignment, PersonId};
use crate::matching::publisher::{PublishOutcome, PublishReport, ResultPublisher, ResultSink};

fn batch(service: &str) -> Vec<Assignment> {
    vec![Assignment {
        person_id: PersonId::from("p1"),
        service_name: Some(service.to_string()),
        cost: 0,
    }]
}

#[test]
fn late_subscribers_only_see_later_publishes() {
    let publisher = ResultPublisher::new();
    let mut early: Vec<_> = (0..3).map(|_| publisher.subscribe()).collect();

    let first = publisher.publish(batch("A"));
    assert_eq!(
        first,
        PublishReport {
            delivered: 3,
            dropped: 0
        }
    );

    let mut late = publisher.subscribe();
    publisher.publish(batch("B"));

    let received = late.try_recv().expect("second payload delivered");
    assert_eq!(received.as_ref(), batch("B").as_slice());
    assert!(matches!(late.try_recv(), Err(TryRecvError::Empty)));

    for subscription in &mut early {
        let first = subscription.try_recv().expect("first payload");
        let second = subscription.try_recv().expect("second payload");
        assert_eq!(first[0].service_name.as_deref(), Some("A"));
        assert_eq!(second[0].service_name.as_deref(), Some("B"));
    }
}

#[test]
fn closed_subscribers_are_dropped_without_affecting_others() {
    let publisher = ResultPublisher::new();
    let mut kept = publisher.subscribe();
    let closed = publisher.subscribe();
    drop(closed);

    let report = publisher.publish(batch("A"));

    assert_eq!(report.delivered, 1);
    assert_eq!(report.dropped, 1);
    assert_eq!(publisher.subscriber_count(), 1);
    assert!(kept.try_recv().is_ok());
}

#[test]
fn unsubscribe_stops_delivery() {
    let publisher = ResultPublisher::new();
    let mut subscription = publisher.subscribe();

    assert!(publisher.unsubscribe(subscription.id()));
    assert!(!publisher.unsubscribe(subscription.id()));

    let report = publisher.publish(batch("A"));
    assert_eq!(report, PublishReport::default());
    assert!(matches!(
        subscription.try_recv(),
        Err(TryRecvError::Disconnected)
    ));
}

#[test]
fn superseded_runs_are_discarded() {
    let publisher = ResultPublisher::new();
    let mut subscription = publisher.subscribe();

    assert!(matches!(
        publisher.publish_run(2, batch("B")),
        PublishOutcome::Delivered(PublishReport { delivered: 1, .. })
    ));
    assert_eq!(
        publisher.publish_run(1, batch("A")),
        PublishOutcome::Superseded {
            sequence: 1,
            latest: 2
        }
    );
    assert!(matches!(
        publisher.publish_run(3, batch("C")),
        PublishOutcome::Delivered(_)
    ));

    let delivered: Vec<_> = std::iter::from_fn(|| subscription.try_recv().ok())
        .map(|payload| payload[0].service_name.clone())
        .collect();
    assert_eq!(delivered, [Some("B".to_string()), Some("C".to_string())]);
}

#[test]
fn subscription_ids_are_unique() {
    let publisher = ResultPublisher::new();
    let first = publisher.subscribe();
    let second = publisher.subscribe();
    assert_ne!(first.id(), second.id());
    assert_eq!(publisher.subscriber_count(), 2);
}

#[test]
fn broadcasts_survive_concurrent_subscription_churn() {
    const PUBLISHES: usize = 200;

    let publisher = ResultPublisher::new();
    let mut steady: Vec<_> = (0..4).map(|_| publisher.subscribe()).collect();

    std::thread::scope(|scope| {
        for _ in 0..3 {
            scope.spawn(|| {
                for _ in 0..PUBLISHES {
                    let transient = publisher.subscribe();
                    assert!(publisher.unsubscribe(transient.id()));
                }
            });
        }
        scope.spawn(|| {
            for round in 0..PUBLISHES {
                let report = publisher.publish(batch(&format!("S{round}")));
                assert!(report.delivered >= 4);
            }
        });
    });

    assert_eq!(publisher.subscriber_count(), 4);
    for subscription in &mut steady {
        let received: Vec<_> = std::iter::from_fn(|| subscription.try_recv().ok())
            .map(|payload| payload[0].service_name.clone())
            .collect();
        let expected: Vec<_> = (0..PUBLISHES)
            .map(|round| Some(format!("S{round}")))
            .collect();
        assert_eq!(received, expected);
    }
}
