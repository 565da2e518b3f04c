//! Rendering and fan-out tests.

use crate::directory::domain::UserId;
use crate::notification::adapters::RecordingNotifier;
use crate::notification::domain::{MessageKind, OutboundMessage};
use crate::notification::ports::{Notifier, NotifierError, NotifierResult};
use crate::notification::services::{MessageRenderer, Template, dispatch};
use async_trait::async_trait;
use minijinja::context;
use mockall::mock;
use mockall::predicate::eq;
use rstest::{fixture, rstest};

mock! {
    Transport {}

    #[async_trait]
    impl Notifier for Transport {
        async fn send(&self, recipient: &UserId, message: &OutboundMessage) -> NotifierResult<()>;
    }
}

#[fixture]
fn renderer() -> MessageRenderer {
    MessageRenderer::new()
}

fn uid(value: &str) -> UserId {
    UserId::new(value).expect("valid user id")
}

#[rstest]
fn assignment_lists_only_known_details(renderer: MessageRenderer) {
    let bare = renderer
        .render(
            Template::TaskAssigned,
            context! { title => "Sweep", creator => "Alice Creator" },
        )
        .expect("renders");
    assert_eq!(bare.kind(), MessageKind::TaskAssigned);
    assert_eq!(bare.text(), "New task for you: \"Sweep\"\nFrom: Alice Creator");

    let detailed = renderer
        .render(
            Template::TaskAssigned,
            context! {
                title => "Sweep",
                creator => "Alice Creator",
                due => "2026-10-13 18:00",
                progress => "0/2",
            },
        )
        .expect("renders");
    assert!(detailed.text().ends_with("\nDue: 2026-10-13 18:00\nSubtasks: 0/2"));
}

#[rstest]
#[case(true, "is due today at 18:00.")]
#[case(false, "is due 2026-10-20 18:00.")]
fn interval_reminder_mentions_today(
    renderer: MessageRenderer,
    #[case] due_today: bool,
    #[case] expected: &str,
) {
    let due = if due_today { "18:00" } else { "2026-10-20 18:00" };
    let message = renderer
        .render(
            Template::IntervalReminder,
            context! { title => "Sweep", due => due, due_today => due_today },
        )
        .expect("renders");
    assert!(message.text().contains(expected), "got {}", message.text());
}

#[rstest]
fn undated_reminder_says_still_open(renderer: MessageRenderer) {
    let message = renderer
        .render(Template::IntervalReminder, context! { title => "Sweep" })
        .expect("renders");
    assert_eq!(message.text(), "Reminder: \"Sweep\" is still open.");
    assert_eq!(message.kind(), MessageKind::IntervalReminder);
}

#[rstest]
fn digest_reports_all_counters(renderer: MessageRenderer) {
    let message = renderer
        .render(
            Template::Digest,
            context! { name => "Bob", active => 4, overdue => 1, due_this_week => 2 },
        )
        .expect("renders");
    assert_eq!(
        message.text(),
        "Good morning, Bob!\nActive tasks: 4\nOverdue: 1\nDue this week: 2"
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn dispatch_isolates_failing_recipients() {
    let notifier = RecordingNotifier::new();
    notifier.fail_for(uid("2"));
    let message = OutboundMessage::new(MessageKind::Info, "hello");

    let report = dispatch(&notifier, [uid("1"), uid("2"), uid("3")], &message).await;

    assert_eq!(report.delivered, [uid("1"), uid("3")]);
    assert_eq!(report.failed, [uid("2")]);
    assert_eq!(report.attempted(), 3);
    assert!(!report.fully_delivered());
    assert_eq!(notifier.attempts(), 3);
}

#[tokio::test(flavor = "multi_thread")]
async fn empty_fan_out_is_not_a_delivery() {
    let report = dispatch(
        &RecordingNotifier::new(),
        Vec::new(),
        &OutboundMessage::new(MessageKind::Info, "hello"),
    )
    .await;
    assert!(!report.fully_delivered());
    assert_eq!(report.attempted(), 0);
}

#[tokio::test(flavor = "multi_thread")]
async fn transport_errors_are_contained() {
    let mut transport = MockTransport::new();
    transport
        .expect_send()
        .with(eq(uid("7")), mockall::predicate::always())
        .times(1)
        .returning(|_, _| Err(NotifierError::transport(std::io::Error::other("timeout"))));
    transport
        .expect_send()
        .with(eq(uid("8")), mockall::predicate::always())
        .times(1)
        .returning(|_, _| Ok(()));

    let message = OutboundMessage::new(MessageKind::DueSoon, "soon");
    let report = dispatch(&transport, [uid("7"), uid("8")], &message).await;

    assert_eq!(report.failed, [uid("7")]);
    assert_eq!(report.delivered, [uid("8")]);
}
