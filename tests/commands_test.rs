//! Command integration tests against the in-memory gateway
//! Run with: cargo test --test commands_test

use std::sync::{Arc, Once};

use hilda::application::formatting::Sheet;
use hilda::application::messaging::{CommandParser, Dispatch, Dispatcher};
use hilda::application::services::{AuditService, CommandService, CommandSettings};
use hilda::domain::entities::{Author, ChannelRef, GuildRef, Incoming};
use hilda::infrastructure::adapters::memory::MemoryGateway;

static INIT: Once = Once::new();

fn ensure_init() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

const SHEET: &str = "
@msg:
    {author}: {content}

@mv:
    {author} moved {amt} from {channel} to {new_channel}

@rm:
    {author} removed {amt} from {members}

@save:
    {author} saved {amt}

@bobbin:
    {author} spun {amt} into {new_channel}

@pin:
    {author} pinned {amt} with {colour}
";

struct Fixture {
    gateway: MemoryGateway,
    dispatcher: Dispatcher,
    guild: GuildRef,
    general: ChannelRef,
    audit: ChannelRef,
    archive: ChannelRef,
    ann: Author,
    bob: Author,
}

impl Fixture {
    async fn new() -> Self {
        Self::with_settings(CommandSettings::default()).await
    }

    async fn with_settings(settings: CommandSettings) -> Self {
        ensure_init();
        let gateway = MemoryGateway::new();
        let guild = gateway.add_guild("Test").await;
        let general = gateway.add_channel(&guild, "general").await;
        let audit = gateway.add_channel(&guild, "audit").await;
        let archive = gateway.add_channel(&guild, "archive").await;
        let ann = gateway.add_member(&guild, "ann", None).await;
        let bob = gateway.add_member(&guild, "bob", Some("bobby")).await;

        let sheet = Arc::new(Sheet::parse(SHEET));
        let dispatcher = Dispatcher::new(
            CommandParser::new("!"),
            CommandService::new(settings, sheet.clone()),
            AuditService::new(sheet, "audit"),
        );

        Self {
            gateway,
            dispatcher,
            guild,
            general,
            audit,
            archive,
            ann,
            bob,
        }
    }

    async fn say(&self, author: &Author, text: &str) {
        self.gateway.post(self.general.id, author, text).await.unwrap();
    }

    async fn run(&self, author: &Author, command: &str) -> Dispatch {
        let incoming = self.gateway.receive(&self.general, author, command).await.unwrap();
        self.dispatcher.dispatch(&self.gateway, incoming).await
    }

    async fn texts(&self, channel: &ChannelRef) -> Vec<String> {
        self.gateway
            .messages(channel.id)
            .await
            .into_iter()
            .map(|m| m.content)
            .collect()
    }
}

#[tokio::test]
async fn test_mv_moves_last_messages_and_audits() {
    let f = Fixture::new().await;
    for text in ["one", "two", "three"] {
        f.say(&f.ann, text).await;
    }

    let outcome = f.run(&f.bob, "!mv 2 archive").await;
    assert_eq!(outcome, Dispatch::Completed("mv".to_string()));

    assert_eq!(f.texts(&f.general).await, vec!["one"]);
    let ann = f.ann.mention();
    assert_eq!(
        f.texts(&f.archive).await,
        vec![format!("{}: two", ann), format!("{}: three", ann)]
    );
    assert_eq!(
        f.texts(&f.audit).await,
        vec![format!("{} moved 2 from {} to Test@archive", f.bob.mention(), f.general.mention())]
    );
}

#[tokio::test]
async fn test_cp_to_another_server_keeps_originals() {
    let f = Fixture::new().await;
    let other = f.gateway.add_guild("Other").await;
    let news = f.gateway.add_channel(&other, "news").await;
    f.say(&f.ann, "hello").await;

    let outcome = f.run(&f.bob, "!cp Other@news").await;
    assert_eq!(outcome, Dispatch::Completed("cp".to_string()));

    assert_eq!(f.texts(&f.general).await, vec!["hello"]);
    assert_eq!(f.texts(&news).await, vec![format!("{}: hello", f.ann.mention())]);
    // the sheet has no cp section
    assert!(f.texts(&f.audit).await.is_empty());
}

#[tokio::test]
async fn test_cp_unknown_channel_is_rejected_without_side_effects() {
    let f = Fixture::new().await;
    f.say(&f.ann, "hello").await;

    let outcome = f.run(&f.bob, "!cp nowhere").await;
    assert_eq!(outcome, Dispatch::Rejected("cp".to_string()));

    let general = f.texts(&f.general).await;
    assert_eq!(general[0], "hello");
    assert_eq!(general[1], "!cp nowhere");
    assert!(general[2].contains("not found"));
}

#[tokio::test]
async fn test_rm_only_removes_selected_members() {
    let f = Fixture::new().await;
    f.say(&f.ann, "a1").await;
    f.say(&f.bob, "b1").await;
    f.say(&f.ann, "a2").await;

    let outcome = f.run(&f.bob, "!rm ann").await;
    assert_eq!(outcome, Dispatch::Completed("rm".to_string()));

    assert_eq!(f.texts(&f.general).await, vec!["b1"]);
    assert_eq!(
        f.texts(&f.audit).await,
        vec![format!("{} removed all from {}", f.bob.mention(), f.ann.mention())]
    );
}

#[tokio::test]
async fn test_rm_with_amount_and_no_members_clears_recent() {
    let f = Fixture::new().await;
    for text in ["a", "b", "c", "d"] {
        f.say(&f.ann, text).await;
    }

    f.run(&f.bob, "!rm 3").await;

    assert_eq!(f.texts(&f.general).await, vec!["a"]);
    assert_eq!(
        f.texts(&f.audit).await,
        vec![format!("{} removed 3 from everyone", f.bob.mention())]
    );
}

#[tokio::test]
async fn test_rm_times_out_without_reaction() {
    let f = Fixture::new().await;
    f.gateway.set_confirm(false);
    f.say(&f.ann, "keep me").await;

    let outcome = f.run(&f.bob, "!rm").await;
    assert_eq!(outcome, Dispatch::Completed("rm".to_string()));

    assert_eq!(
        f.texts(&f.general).await,
        vec!["keep me", "Timed out. Please try again."]
    );
}

#[tokio::test]
async fn test_pin_pins_last_messages() {
    let f = Fixture::new().await;
    for text in ["one", "two", "three"] {
        f.say(&f.ann, text).await;
    }
    let ids: Vec<u64> = f.gateway.messages(f.general.id).await.iter().map(|m| m.id).collect();

    f.run(&f.ann, "!pin 2").await;

    assert_eq!(f.gateway.pinned(f.general.id).await, vec![ids[1], ids[2]]);
}

#[tokio::test]
async fn test_bobbin_moves_messages_into_new_thread() {
    let f = Fixture::new().await;
    for text in ["one", "two", "three"] {
        f.say(&f.ann, text).await;
    }

    let outcome = f.run(&f.bob, "!bobbin 2 \"old stuff\"").await;
    assert_eq!(outcome, Dispatch::Completed("bobbin".to_string()));

    let thread = f
        .gateway
        .channels()
        .await
        .into_iter()
        .find(|c| c.name == "old stuff")
        .expect("thread created");
    assert_eq!(thread.guild, f.guild);
    assert_eq!(f.texts(&f.general).await, vec!["one"]);
    let ann = f.ann.mention();
    assert_eq!(
        f.texts(&thread).await,
        vec![format!("{}: two", ann), format!("{}: three", ann)]
    );
    assert_eq!(
        f.texts(&f.audit).await,
        vec![format!("{} spun 2 into old stuff", f.bob.mention())]
    );
}

#[tokio::test]
async fn test_bobbin_requires_name() {
    let f = Fixture::new().await;
    let outcome = f.run(&f.bob, "!bobbin 5").await;
    assert_eq!(outcome, Dispatch::Rejected("bobbin".to_string()));
}

#[tokio::test]
async fn test_save_is_disabled_unless_running_locally() {
    let f = Fixture::new().await;
    f.say(&f.ann, "one").await;

    let outcome = f.run(&f.ann, "!save").await;
    assert_eq!(outcome, Dispatch::Rejected("save".to_string()));
    assert!(f.gateway.files().await.is_empty());
}

#[tokio::test]
async fn test_save_writes_plain_backup_and_uploads_it() {
    let dir = tempfile::tempdir().unwrap();
    let settings = CommandSettings {
        running_locally: true,
        backup_dir: dir.path().to_path_buf(),
        ..CommandSettings::default()
    };
    let f = Fixture::with_settings(settings).await;
    f.say(&f.ann, "one").await;
    f.say(&f.bob, "two").await;

    let outcome = f.run(&f.ann, "!save").await;
    assert_eq!(outcome, Dispatch::Completed("save".to_string()));

    let files = f.gateway.files().await;
    assert_eq!(files.len(), 1);
    let (channel_id, path) = &files[0];
    assert_eq!(*channel_id, f.general.id);
    assert!(path
        .file_name()
        .unwrap()
        .to_string_lossy()
        .starts_with("Backup of Test@general at "));
    assert_eq!(std::fs::read_to_string(path).unwrap(), "ann: one\n\nbob: two\n\n");
}

#[tokio::test]
async fn test_guild_only_command_in_direct_message() {
    let f = Fixture::new().await;
    let dms = f.gateway.add_guild("dm").await;
    let dm = f.gateway.add_channel(&dms, "bob").await;
    let id = f.gateway.post(dm.id, &f.bob, "!pin").await.unwrap();

    let incoming = Incoming::direct(id, f.bob.clone(), dm.id, "!pin");
    let outcome = f.dispatcher.dispatch(&f.gateway, incoming).await;

    assert_eq!(outcome, Dispatch::Rejected("pin".to_string()));
    assert_eq!(f.texts(&dm).await, vec!["!pin", "Hilda only works in servers!"]);
}

#[tokio::test]
async fn test_help_lists_commands() {
    let f = Fixture::new().await;
    let outcome = f.run(&f.ann, "!help").await;
    assert_eq!(outcome, Dispatch::Completed("help".to_string()));

    let general = f.texts(&f.general).await;
    assert_eq!(general.len(), 1);
    for name in ["!bobbin", "!cp", "!mv", "!pin", "!rm", "!save"] {
        assert!(general[0].contains(name), "help is missing {}", name);
    }
}

#[tokio::test]
async fn test_non_commands_unknown_commands_and_bots_are_left_alone() {
    let f = Fixture::new().await;

    assert_eq!(f.run(&f.ann, "just chatting").await, Dispatch::Ignored);
    assert_eq!(f.run(&f.ann, "!nope").await, Dispatch::UnknownCommand("nope".to_string()));

    let incoming = f.gateway.receive(&f.general, &f.bob, "!rm").await.unwrap().from_bot();
    assert_eq!(f.dispatcher.dispatch(&f.gateway, incoming).await, Dispatch::Ignored);

    assert_eq!(f.texts(&f.general).await, vec!["just chatting", "!nope", "!rm"]);
}

#[tokio::test]
async fn test_negative_amount_is_rejected() {
    let f = Fixture::new().await;
    f.say(&f.ann, "one").await;

    assert_eq!(f.run(&f.ann, "!pin -1").await, Dispatch::Rejected("pin".to_string()));
    assert!(f.gateway.pinned(f.general.id).await.is_empty());
}

#[tokio::test]
async fn test_audit_section_with_unknown_placeholder_is_skipped() {
    let f = Fixture::new().await;
    f.say(&f.ann, "one").await;

    let outcome = f.run(&f.ann, "!pin").await;
    assert_eq!(outcome, Dispatch::Completed("pin".to_string()));

    assert_eq!(f.gateway.pinned(f.general.id).await.len(), 1);
    assert!(f.texts(&f.audit).await.is_empty());
}

#[tokio::test]
async fn test_zero_amount_acts_on_nothing_and_audits_all() {
    let f = Fixture::new().await;
    f.say(&f.ann, "one").await;
    f.say(&f.ann, "two").await;

    let outcome = f.run(&f.bob, "!rm 0").await;
    assert_eq!(outcome, Dispatch::Completed("rm".to_string()));

    assert_eq!(f.texts(&f.general).await, vec!["one", "two"]);
    assert_eq!(
        f.texts(&f.audit).await,
        vec![format!("{} removed all from everyone", f.bob.mention())]
    );
}

#[tokio::test]
async fn test_help_for_one_command() {
    let f = Fixture::new().await;
    f.run(&f.ann, "!help rm").await;

    let general = f.texts(&f.general).await;
    assert_eq!(general.len(), 1);
    assert!(general[0].starts_with("!rm - "));
    assert!(general[0].contains("Usage: !rm [amt] [members...]"));
    assert!(general[0].contains("Aliases: purge"));
}

#[tokio::test]
async fn test_help_for_unknown_command() {
    let f = Fixture::new().await;
    f.run(&f.ann, "!help nope").await;

    assert_eq!(f.texts(&f.general).await, vec!["Command !nope not found"]);
}

#[tokio::test]
async fn test_rm_alias() {
    let f = Fixture::new().await;
    f.say(&f.ann, "a1").await;
    f.say(&f.bob, "b1").await;

    let outcome = f.run(&f.bob, "!purge ann").await;
    assert_eq!(outcome, Dispatch::Completed("rm".to_string()));
    assert_eq!(f.texts(&f.general).await, vec!["b1"]);
}

#[tokio::test]
async fn test_rm_with_unknown_member_mention_is_rejected() {
    let f = Fixture::new().await;
    f.say(&f.ann, "a1").await;
    f.say(&f.bob, "b1").await;

    let outcome = f.run(&f.bob, "!rm <@999999999999999999>").await;
    assert_eq!(outcome, Dispatch::Rejected("rm".to_string()));

    let general = f.texts(&f.general).await;
    assert_eq!(general.len(), 4);
    assert_eq!(general[..3], ["a1", "b1", "!rm <@999999999999999999>"]);
    assert!(general[3].contains("not found"));
}

#[tokio::test]
async fn test_rm_with_zero_id_mention_is_rejected() {
    let f = Fixture::new().await;
    f.say(&f.ann, "a1").await;

    assert_eq!(f.run(&f.bob, "!rm 5 <@0>").await, Dispatch::Rejected("rm".to_string()));
    assert_eq!(f.texts(&f.general).await[0], "a1");
}

#[tokio::test]
async fn test_direct_message_from_bot_is_ignored() {
    let f = Fixture::new().await;
    let dms = f.gateway.add_guild("dm").await;
    let dm = f.gateway.add_channel(&dms, "bob").await;
    let id = f.gateway.post(dm.id, &f.bob, "!pin").await.unwrap();

    let incoming = Incoming::direct(id, f.bob.clone(), dm.id, "!pin").from_bot();
    assert_eq!(f.dispatcher.dispatch(&f.gateway, incoming).await, Dispatch::Ignored);
    assert_eq!(f.texts(&dm).await, vec!["!pin"]);
}
