use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use parking_lot::Mutex;

use super::*;
use crate::account::{InMemoryDirectory, PlayerAccount};
use crate::common::clock::ManualClock;
use crate::common::{Clock, StorageError, StorageResult};
use crate::config::Config;
use crate::filter::FnFilter;

#[derive(Default)]
struct RecordingSink {
    deliveries: Mutex<Vec<(AccountId, String)>>,
}

impl RecordingSink {
    fn received(&self, id: AccountId) -> Vec<String> {
        self.deliveries
            .lock()
            .iter()
            .filter(|(to, _)| *to == id)
            .map(|(_, text)| text.clone())
            .collect()
    }

    fn recipients(&self) -> Vec<AccountId> {
        self.deliveries.lock().iter().map(|(to, _)| *to).collect()
    }

    fn total(&self) -> usize {
        self.deliveries.lock().len()
    }
}

impl DeliverySink for RecordingSink {
    fn deliver(&self, recipient: &dyn Account, message: &RenderedMessage) {
        self.deliveries
            .lock()
            .push((recipient.id(), message.plain_text()));
    }
}

#[derive(Default)]
struct RecordingLogger {
    lines: Mutex<Vec<String>>,
    unavailable: bool,
}

impl ChatLogger for RecordingLogger {
    fn log_message(&self, label: &str, context: &Context) -> StorageResult<()> {
        if self.unavailable {
            return Err(StorageError::Unavailable {
                message: "disk full".to_string(),
            });
        }
        self.lines.lock().push(format!(
            "{} {}",
            label,
            context.best_text().unwrap_or_default()
        ));
        Ok(())
    }
}

struct Harness {
    directory: Arc<InMemoryDirectory>,
    sink: Arc<RecordingSink>,
    logger: Arc<RecordingLogger>,
    clock: Arc<ManualClock>,
    dispatcher: Dispatcher,
}

impl Harness {
    fn new(config: Config) -> Self {
        Self::with_logger(config, RecordingLogger::default())
    }

    fn with_logger(config: Config, logger: RecordingLogger) -> Self {
        let directory = Arc::new(InMemoryDirectory::new());
        let sink = Arc::new(RecordingSink::default());
        let logger = Arc::new(logger);
        let clock = Arc::new(ManualClock::new());
        let modules = Arc::new(ModuleRegistry::from_config(
            &config.modules,
            &config.messages,
            Arc::new(crate::filter::Filters::new()),
            Arc::clone(&clock) as Arc<dyn Clock>,
        ));
        let dispatcher = Dispatcher::new(
            Arc::clone(&directory) as Arc<dyn AccountDirectory>,
            Arc::clone(&sink) as Arc<dyn DeliverySink>,
            modules,
            RelaySettings::from(&config),
        )
        .with_chat_logger(Arc::clone(&logger) as Arc<dyn ChatLogger>);

        Self {
            directory,
            sink,
            logger,
            clock,
            dispatcher,
        }
    }

    fn player(&self, id: AccountId, name: &str, server: &str) -> Arc<PlayerAccount> {
        self.directory
            .connect(PlayerAccount::new(id, name).on_server(server))
    }

    fn logged(&self) -> Vec<String> {
        self.logger.lines.lock().clone()
    }
}

fn multicast_config() -> Config {
    let mut config = Config::default();
    config.modules.multicast_chat.enabled = true;
    config.modules.multicast_chat.server_groups = vec![
        vec!["a".to_string(), "b".to_string()],
        vec!["c".to_string(), "d".to_string()],
    ];
    config
}

#[test]
fn test_local_reaches_same_server_only() {
    let h = Harness::new(Config::default());
    h.player(1, "alice", "lobby");
    h.player(2, "bob", "lobby");
    h.player(3, "carol", "survival");

    let outcome = h
        .dispatcher
        .send_message(1, Some(ChannelType::Local), "hello")
        .unwrap();

    assert_eq!(outcome, Outcome::Delivered { recipients: 2 });
    assert_eq!(h.sink.received(2), vec!["[lobby] alice: hello"]);
    assert_eq!(h.sink.received(1), vec!["[lobby] alice: hello"]);
    assert!(h.sink.received(3).is_empty());
    assert_eq!(h.logged(), vec!["LOCAL hello"]);
}

#[test]
fn test_ignoring_recipient_skipped() {
    let h = Harness::new(Config::default());
    h.player(1, "alice", "lobby");
    h.player(2, "bob", "lobby").ignore(1);
    h.player(3, "carol", "lobby");

    h.dispatcher
        .send_message(1, Some(ChannelType::Local), "hello")
        .unwrap();

    assert!(h.sink.received(2).is_empty());
    assert_eq!(h.sink.received(3).len(), 1);
}

#[test]
fn test_ignore_lists_unused_when_module_disabled() {
    let mut config = Config::default();
    config.modules.ignoring.enabled = false;
    let h = Harness::new(config);
    h.player(1, "alice", "lobby");
    h.player(2, "bob", "lobby").ignore(1);

    h.dispatcher
        .send_message(1, Some(ChannelType::Local), "hello")
        .unwrap();
    assert_eq!(h.sink.received(2).len(), 1);
}

#[test]
fn test_local_relayed_to_multicast_group_once() {
    let h = Harness::new(multicast_config());
    h.player(1, "alice", "a");
    h.player(2, "bob", "a");
    h.player(3, "carol", "b");
    h.player(4, "dave", "c");

    let outcome = h
        .dispatcher
        .send_message(1, Some(ChannelType::Local), "hi all")
        .unwrap();

    assert_eq!(outcome, Outcome::Delivered { recipients: 3 });
    assert_eq!(h.sink.received(2), vec!["[a] alice: hi all"]);
    assert_eq!(h.sink.received(3), vec!["[a] alice: hi all"]);
    assert!(h.sink.received(4).is_empty());

    let mut recipients = h.sink.recipients();
    recipients.sort_unstable();
    assert_eq!(recipients, vec![1, 2, 3]);
    assert_eq!(h.logged(), vec!["LOCAL hi all"]);
}

#[test]
fn test_ungrouped_server_stays_local() {
    let h = Harness::new(multicast_config());
    h.player(1, "alice", "e");
    h.player(2, "bob", "e");
    h.player(3, "carol", "a");

    let outcome = h
        .dispatcher
        .send_message(1, Some(ChannelType::Local), "hi")
        .unwrap();
    assert_eq!(outcome, Outcome::Delivered { recipients: 2 });
    assert!(h.sink.received(3).is_empty());
}

#[test]
fn test_direct_multicast_includes_source() {
    let h = Harness::new(multicast_config());
    h.player(1, "alice", "a");
    h.player(2, "bob", "b");
    h.player(3, "carol", "c");

    let outcome = h
        .dispatcher
        .send_message(1, Some(ChannelType::Multicast), "group")
        .unwrap();
    assert_eq!(outcome, Outcome::Delivered { recipients: 2 });
    assert!(h.sink.received(3).is_empty());
    assert!(h.logged().is_empty());
}

#[test]
fn test_direct_multicast_without_module_stays_on_source_server() {
    let mut config = multicast_config();
    config.modules.multicast_chat.enabled = false;
    let h = Harness::new(config);
    h.player(1, "alice", "a");
    h.player(2, "bob", "b");

    let outcome = h
        .dispatcher
        .send_message(1, Some(ChannelType::Multicast), "hi")
        .unwrap();
    assert_eq!(outcome, Outcome::Delivered { recipients: 1 });
    assert_eq!(h.sink.received(1), vec!["[a] alice: hi"]);
    assert!(h.sink.received(2).is_empty());

    h.dispatcher.modules().enable(ModuleKind::MulticastChat);
    h.dispatcher
        .send_message(1, Some(ChannelType::Multicast), "again")
        .unwrap();
    assert_eq!(h.sink.received(2), vec!["[a] alice: again"]);
}

#[test]
fn test_duplicate_blocked_and_sender_notified() {
    let h = Harness::new(Config::default());
    h.player(1, "alice", "lobby");
    h.player(2, "bob", "lobby");

    h.dispatcher
        .send_message(1, Some(ChannelType::Local), "buy now")
        .unwrap();
    h.clock.advance(Duration::from_secs(5));
    let outcome = h
        .dispatcher
        .send_message(1, Some(ChannelType::Local), "buy now")
        .unwrap();

    let notice = Config::default().messages.anti_duplication;
    assert_eq!(
        outcome,
        Outcome::Blocked {
            reason: RenderedMessage::text(notice.as_str())
        }
    );
    assert_eq!(h.sink.received(2).len(), 1);
    assert_eq!(h.sink.received(1).last(), Some(&notice));
    assert_eq!(h.logged().len(), 1);

    h.clock.advance(Duration::from_secs(61));
    let outcome = h
        .dispatcher
        .send_message(1, Some(ChannelType::Local), "buy now")
        .unwrap();
    assert!(matches!(outcome, Outcome::Delivered { .. }));
}

#[test]
fn test_duplicates_must_match_exactly() {
    let h = Harness::new(Config::default());
    h.player(1, "alice", "lobby");
    h.player(2, "bob", "lobby");

    for message in ["Hello", "hello"] {
        let outcome = h
            .dispatcher
            .send_message(1, Some(ChannelType::Local), message)
            .unwrap();
        assert_eq!(outcome, Outcome::Delivered { recipients: 2 });
    }
    assert_eq!(h.sink.received(2), vec!["[lobby] alice: Hello", "[lobby] alice: hello"]);
}

#[test]
fn test_disabled_module_stops_filtering() {
    let h = Harness::new(Config::default());
    h.player(1, "alice", "lobby");

    h.dispatcher.modules().disable(ModuleKind::AntiDuplication);
    for _ in 0..3 {
        let outcome = h
            .dispatcher
            .send_message(1, Some(ChannelType::Local), "again")
            .unwrap();
        assert!(matches!(outcome, Outcome::Delivered { .. }));
    }
}

#[test]
fn test_spam_limit() {
    let mut config = Config::default();
    config.modules.anti_duplication.enabled = false;
    config.modules.anti_spam.messages_per_minute = 2;
    let h = Harness::new(config);
    h.player(1, "alice", "lobby");

    for text in ["one", "two"] {
        assert!(matches!(
            h.dispatcher.send_message(1, None, text).unwrap(),
            Outcome::Delivered { .. }
        ));
    }
    assert!(matches!(
        h.dispatcher.send_message(1, None, "three").unwrap(),
        Outcome::Blocked { .. }
    ));

    h.clock.advance(Duration::from_secs(60));
    assert!(matches!(
        h.dispatcher.send_message(1, None, "four").unwrap(),
        Outcome::Delivered { .. }
    ));
}

#[test]
fn test_pattern_filter_and_bypass() {
    let mut config = Config::default();
    config.modules.filter.enabled = true;
    config.modules.filter.patterns = vec!["(?i)badword".to_string()];
    let h = Harness::new(config);
    h.player(1, "alice", "lobby");
    h.player(2, "bob", "lobby");
    h.player(3, "mod", "lobby").grant(Permission::BypassFilter);

    let outcome = h
        .dispatcher
        .send_message(1, Some(ChannelType::Global), "a BADWORD")
        .unwrap();
    assert!(matches!(outcome, Outcome::Blocked { .. }));
    assert!(h.sink.received(2).is_empty());

    let outcome = h
        .dispatcher
        .send_message(3, Some(ChannelType::Global), "a BADWORD")
        .unwrap();
    assert_eq!(outcome, Outcome::Delivered { recipients: 3 });
}

#[test]
fn test_muted_sender_blocked() {
    let h = Harness::new(Config::default());
    h.player(1, "alice", "lobby")
        .mute_until(Some(Utc::now() + chrono::Duration::hours(1)));
    h.player(2, "bob", "lobby");

    let outcome = h.dispatcher.send_message(1, None, "hi").unwrap();
    assert_eq!(
        outcome,
        Outcome::Blocked {
            reason: RenderedMessage::text("You are muted.")
        }
    );
    assert!(h.sink.received(2).is_empty());
}

#[test]
fn test_emoji_substituted_after_parse() {
    let h = Harness::new(Config::default());
    h.player(1, "alice", "lobby");

    h.dispatcher
        .send_message(1, None, "nice :smile: https://x.org")
        .unwrap();
    assert_eq!(
        h.sink.received(1),
        vec!["[lobby] alice: nice 😄 https://x.org"]
    );
}

#[test]
fn test_custom_pre_parse_filter_rewrites() {
    let h = Harness::new(Config::default());
    h.player(1, "alice", "lobby");
    h.dispatcher.modules().filters().add_pre_parse_filter(
        "Caps",
        Arc::new(FnFilter::new(|message: &str| message.to_uppercase())),
    );

    h.dispatcher.send_message(1, None, "quiet").unwrap();
    assert_eq!(h.sink.received(1), vec!["[lobby] alice: QUIET"]);
    assert_eq!(h.logged(), vec!["LOCAL QUIET"]);
}

#[test]
fn test_private_message_with_social_spy() {
    let h = Harness::new(Config::default());
    h.player(1, "alice", "lobby");
    h.player(2, "bob", "survival");
    let spy = h.player(3, "carol", "lobby");
    spy.grant(Permission::SocialSpy);
    spy.set_social_spy(true);
    h.player(4, "dave", "lobby").grant(Permission::SocialSpy);

    let outcome = h.dispatcher.send_private_message(1, 2, "psst").unwrap();

    assert_eq!(outcome, Outcome::Delivered { recipients: 3 });
    assert_eq!(h.sink.received(1), vec!["[me -> bob] psst"]);
    assert_eq!(h.sink.received(2), vec!["[alice -> me] psst"]);
    assert_eq!(h.sink.received(3), vec!["[Spy] alice -> bob: psst"]);
    assert!(h.sink.received(4).is_empty());
    assert_eq!(h.logged(), vec!["PM to bob psst"]);
}

#[test]
fn test_social_spy_exempt_sender() {
    let h = Harness::new(Config::default());
    h.player(1, "alice", "lobby").grant(Permission::SocialSpyExempt);
    h.player(2, "bob", "lobby");
    let spy = h.player(3, "carol", "lobby");
    spy.grant(Permission::SocialSpy);
    spy.set_social_spy(true);

    h.dispatcher.send_private_message(1, 2, "psst").unwrap();
    assert!(h.sink.received(3).is_empty());
}

#[test]
fn test_private_message_to_ignoring_target_refused() {
    let h = Harness::new(Config::default());
    h.player(1, "alice", "lobby");
    h.player(2, "bob", "lobby").ignore(1);

    let outcome = h.dispatcher.send_private_message(1, 2, "hey").unwrap();

    let notice = Config::default().messages.has_ignored;
    assert_eq!(
        outcome,
        Outcome::Refused {
            reason: RenderedMessage::text(notice.as_str())
        }
    );
    assert_eq!(h.sink.received(1), vec![notice]);
    assert!(h.sink.received(2).is_empty());
    assert!(h.logged().is_empty());
}

#[test]
fn test_private_ignore_refusal_without_ignoring_module() {
    let mut config = Config::default();
    config.modules.ignoring.enabled = false;
    let h = Harness::new(config);
    h.player(1, "alice", "lobby");
    h.player(2, "bob", "lobby").ignore(1);

    let outcome = h.dispatcher.send_private_message(1, 2, "hey").unwrap();
    assert!(matches!(outcome, Outcome::Refused { .. }));
    assert!(h.sink.received(2).is_empty());

    h.directory.get(1).unwrap().grant(Permission::BypassIgnore);
    let outcome = h.dispatcher.send_private_message(1, 2, "hey").unwrap();
    assert!(matches!(outcome, Outcome::Delivered { .. }));
}

#[test]
fn test_private_message_messenger_disabled() {
    let h = Harness::new(Config::default());
    h.player(1, "alice", "lobby");
    h.player(2, "bob", "lobby").set_messenger(false);

    let outcome = h.dispatcher.send_private_message(1, 2, "hey").unwrap();
    assert!(matches!(outcome, Outcome::Refused { .. }));
    assert!(h.sink.received(2).is_empty());

    h.directory
        .get(1)
        .unwrap()
        .grant(Permission::BypassMessenger);
    let outcome = h.dispatcher.send_private_message(1, 2, "hey").unwrap();
    assert!(matches!(outcome, Outcome::Delivered { .. }));
}

#[test]
fn test_private_messages_skip_filters_when_configured() {
    let mut config = Config::default();
    config.modules.messenger.filter_private_messages = false;
    let h = Harness::new(config);
    h.player(1, "alice", "lobby");
    h.player(2, "bob", "lobby");

    for _ in 0..2 {
        let outcome = h.dispatcher.send_private_message(1, 2, "same").unwrap();
        assert!(matches!(outcome, Outcome::Delivered { .. }));
    }
}

#[test]
fn test_staff_chat_needs_permission() {
    let h = Harness::new(Config::default());
    h.player(1, "alice", "lobby").grant(Permission::StaffChatView);
    h.player(2, "bob", "lobby");
    h.player(3, "carol", "survival").grant(Permission::StaffChatView);

    let outcome = h
        .dispatcher
        .send_message(1, Some(ChannelType::Staff), "ban him")
        .unwrap();
    assert_eq!(outcome, Outcome::Delivered { recipients: 2 });
    assert!(h.sink.received(2).is_empty());
    assert_eq!(h.sink.received(3), vec!["[Staff] alice: ban him"]);
}

#[test]
fn test_staff_chat_ignores_ignore_lists() {
    let h = Harness::new(Config::default());
    h.player(1, "alice", "lobby");
    let bob = h.player(2, "bob", "lobby");
    bob.grant(Permission::StaffChatView);
    bob.ignore(1);

    h.dispatcher
        .send_message(1, Some(ChannelType::Staff), "listen")
        .unwrap();
    assert_eq!(h.sink.received(2).len(), 1);
}

#[test]
fn test_global_server_list() {
    let mut config = Config::default();
    config.modules.global_chat.server_list.enabled = true;
    config.modules.global_chat.server_list.list = vec!["a".to_string(), "b".to_string()];
    let h = Harness::new(config);
    h.player(1, "alice", "a");
    h.player(2, "bob", "b");
    h.player(3, "carol", "c");

    let outcome = h
        .dispatcher
        .send_message(1, Some(ChannelType::Global), "everyone")
        .unwrap();
    assert_eq!(outcome, Outcome::Delivered { recipients: 2 });
    assert_eq!(h.sink.received(2), vec!["[Global] alice: everyone"]);
    assert!(h.sink.received(3).is_empty());
    assert_eq!(h.logged(), vec!["GLOBAL everyone"]);
}

#[test]
fn test_alert_skips_filters() {
    let h = Harness::new(Config::default());
    h.player(1, "alice", "lobby")
        .mute_until(Some(Utc::now() + chrono::Duration::hours(1)));
    h.player(2, "bob", "survival");

    let outcome = h.dispatcher.send_alert(1, "restart in 5").unwrap();
    assert_eq!(outcome, Outcome::Delivered { recipients: 2 });
    assert_eq!(h.sink.received(2), vec!["[Alert] restart in 5"]);
}

#[test]
fn test_join_message() {
    let h = Harness::new(Config::default());
    h.player(1, "alice", "lobby");
    h.player(2, "bob", "lobby").grant(Permission::JoinMessageView);
    h.player(3, "carol", "lobby");

    let outcome = h.dispatcher.send_join_message(1).unwrap();
    assert_eq!(outcome, Outcome::Delivered { recipients: 1 });
    assert_eq!(h.sink.received(2), vec!["alice has joined the network"]);
    assert!(h.logged().is_empty());
}

#[test]
fn test_vanished_leave_only_visible_to_vanish_viewers() {
    let h = Harness::new(Config::default());
    h.player(1, "alice", "lobby").set_vanished(true);
    h.player(2, "bob", "lobby").grant(Permission::LeaveMessageView);
    let staff = h.player(3, "carol", "lobby");
    staff.grant(Permission::LeaveMessageView);
    staff.grant(Permission::VanishView);

    let outcome = h.dispatcher.send_leave_message(1).unwrap();
    assert_eq!(outcome, Outcome::Delivered { recipients: 1 });
    assert!(h.sink.received(2).is_empty());
    assert_eq!(h.sink.received(3), vec!["alice has left the network"]);
}

#[test]
fn test_vanish_does_not_hide_chat() {
    let h = Harness::new(Config::default());
    h.player(1, "alice", "lobby").set_vanished(true);
    h.player(2, "bob", "lobby");

    h.dispatcher.send_message(1, None, "boo").unwrap();
    assert_eq!(h.sink.received(2).len(), 1);
}

#[test]
fn test_switch_message_names_new_server() {
    let h = Harness::new(Config::default());
    let alice = h.player(1, "alice", "lobby");
    h.player(2, "bob", "lobby").grant(Permission::SwitchMessageView);

    alice.set_server(Some("survival".into()));
    h.dispatcher
        .send_switch_message(1, ServerName::from("survival"))
        .unwrap();
    assert_eq!(h.sink.received(2), vec!["alice has moved to survival"]);
}

#[test]
fn test_join_with_message_rejected() {
    let h = Harness::new(Config::default());
    let alice = h.player(1, "alice", "lobby");
    h.player(2, "bob", "lobby").grant(Permission::JoinMessageView);

    let ctx = Context::for_sender(alice)
        .with_channel(ChannelType::Join)
        .with_message("hello");
    let err = h.dispatcher.dispatch(ctx).unwrap_err();
    assert_eq!(
        err,
        ContextError::MissingRequirement {
            requirement: "HAS_NO_MESSAGE".to_string()
        }
    );
    assert_eq!(h.sink.total(), 0);
}

#[test]
fn test_missing_sender_rejected() {
    let h = Harness::new(Config::default());
    h.player(2, "bob", "lobby");

    let err = h
        .dispatcher
        .dispatch(Context::new().with_message("orphan").with_server("lobby"))
        .unwrap_err();
    assert_eq!(err.to_string(), "Context does not meet requirement HAS_SENDER!");
    assert_eq!(h.sink.total(), 0);
    assert!(h.logged().is_empty());
}

#[test]
fn test_local_without_server_rejected() {
    let h = Harness::new(Config::default());
    h.directory.connect(PlayerAccount::new(1, "alice"));

    let err = h
        .dispatcher
        .send_message(1, Some(ChannelType::Local), "where am i")
        .unwrap_err();
    assert_eq!(err.to_string(), "Context does not meet requirement HAS_SERVER!");
    assert_eq!(h.sink.total(), 0);
}

#[test]
fn test_private_without_target_rejected() {
    let h = Harness::new(Config::default());
    let alice = h.player(1, "alice", "lobby");

    let ctx = Context::for_sender(alice)
        .with_channel(ChannelType::Private)
        .with_message("to nobody");
    let err = h.dispatcher.dispatch(ctx).unwrap_err();
    assert_eq!(err.to_string(), "Context does not meet requirement HAS_TARGET!");
}

#[test]
fn test_unknown_account() {
    let h = Harness::new(Config::default());
    let err = h.dispatcher.send_message(42, None, "hi").unwrap_err();
    assert_eq!(err, ContextError::UnknownAccount { id: 42 });
}

#[test]
fn test_channel_fallback() {
    let mut config = Config::default();
    config.default_channel = ChannelType::Global;
    let h = Harness::new(config);
    h.directory
        .connect(PlayerAccount::new(1, "alice").on_server("lobby").with_channel(ChannelType::Local));
    h.player(2, "bob", "lobby");
    h.player(3, "carol", "survival");

    h.dispatcher.send_message(1, None, "pref").unwrap();
    assert_eq!(h.sink.received(3).len(), 0);

    h.dispatcher.send_message(2, None, "default").unwrap();
    assert_eq!(h.sink.received(3), vec!["[Global] bob: default"]);
}

#[test]
fn test_local_spy_sees_other_servers() {
    let h = Harness::new(Config::default());
    h.player(1, "alice", "lobby");
    let remote = h.player(2, "spy", "survival");
    remote.grant(Permission::LocalSpy);
    remote.set_local_spy(true);
    let local = h.player(3, "spy2", "lobby");
    local.grant(Permission::LocalSpy);
    local.set_local_spy(true);

    let outcome = h.dispatcher.send_message(1, None, "secret").unwrap();
    assert_eq!(outcome, Outcome::Delivered { recipients: 3 });
    assert_eq!(h.sink.received(2), vec!["[Spy lobby] alice: secret"]);
    assert_eq!(h.sink.received(3), vec!["[lobby] alice: secret"]);
}

#[test]
fn test_local_spy_skips_multicast_recipients() {
    let h = Harness::new(multicast_config());
    h.player(1, "alice", "a");
    let grouped = h.player(2, "spy", "b");
    grouped.grant(Permission::LocalSpy);
    grouped.set_local_spy(true);
    let outside = h.player(3, "spy2", "c");
    outside.grant(Permission::LocalSpy);
    outside.set_local_spy(true);

    h.dispatcher.send_message(1, None, "hi").unwrap();
    assert_eq!(h.sink.received(2), vec!["[a] alice: hi"]);
    assert_eq!(h.sink.received(3), vec!["[Spy a] alice: hi"]);
}

#[test]
fn test_local_spy_copy_keeps_local_channel_after_relay() {
    let mut config = multicast_config();
    config.formats.local_spy = "[Spy %channel %server] %user: %message".to_string();
    let h = Harness::new(config);
    h.player(1, "alice", "a");
    h.player(2, "carol", "b");
    let spy = h.player(3, "spy", "c");
    spy.grant(Permission::LocalSpy);
    spy.set_local_spy(true);

    h.dispatcher
        .send_message(1, Some(ChannelType::Local), "hi")
        .unwrap();
    assert_eq!(h.sink.received(2), vec!["[a] alice: hi"]);
    assert_eq!(h.sink.received(3), vec!["[Spy local a] alice: hi"]);
}

#[test]
fn test_chat_log_failure_does_not_block_delivery() {
    let logger = RecordingLogger {
        unavailable: true,
        ..RecordingLogger::default()
    };
    let h = Harness::with_logger(Config::default(), logger);
    h.player(1, "alice", "lobby");
    h.player(2, "bob", "lobby");

    let outcome = h.dispatcher.send_message(1, None, "still here").unwrap();
    assert_eq!(outcome, Outcome::Delivered { recipients: 2 });
    assert_eq!(h.sink.received(2).len(), 1);
}

#[test]
fn test_chat_logging_module_disabled() {
    let h = Harness::new(Config::default());
    h.player(1, "alice", "lobby");
    h.dispatcher.modules().disable(ModuleKind::ChatLogging);

    h.dispatcher.send_message(1, None, "quiet").unwrap();
    assert!(h.logged().is_empty());
}

#[test]
fn test_concurrent_senders() {
    let mut config = Config::default();
    config.modules.anti_spam.messages_per_minute = 1000;
    let h = Harness::new(config);
    for id in 1..=8 {
        h.player(id, &format!("p{id}"), "lobby");
    }

    std::thread::scope(|scope| {
        for id in 1..=8u64 {
            let dispatcher = &h.dispatcher;
            scope.spawn(move || {
                for i in 0..10 {
                    let outcome = dispatcher
                        .send_message(id, None, &format!("message {i}"))
                        .unwrap();
                    assert_eq!(outcome, Outcome::Delivered { recipients: 8 });
                }
            });
        }
    });

    assert_eq!(h.sink.total(), 8 * 10 * 8);
    assert_eq!(h.logged().len(), 80);
}

#[test]
fn test_concurrent_duplicates_from_one_sender() {
    let h = Harness::new(Config::default());
    h.player(1, "alice", "lobby");

    let delivered: usize = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let dispatcher = &h.dispatcher;
                scope.spawn(move || {
                    usize::from(matches!(
                        dispatcher.send_message(1, None, "race").unwrap(),
                        Outcome::Delivered { .. }
                    ))
                })
            })
            .collect();
        handles.into_iter().map(|handle| handle.join().unwrap()).sum()
    });

    assert_eq!(delivered, 1);
}
