use super::*;
use crate::api::ModelDetails;
use crate::core::conversation::DEFAULT_CHAT_TITLE;
use crate::core::store::MemoryStore;
use crate::utils::test_utils::{
    create_test_manager, create_test_manager_with_config, create_test_messages,
};

fn model(name: &str) -> ModelInfo {
    ModelInfo {
        name: name.to_string(),
        modified_at: None,
        size: None,
        digest: None,
        details: ModelDetails {
            parameter_size: "7B".to_string(),
            ..Default::default()
        },
    }
}

fn manager_with_model() -> ConversationManager<MemoryStore> {
    let mut manager = create_test_manager();
    manager.set_available_models(vec![model("llama2"), model("mistral")], None);
    manager
}

fn last_write(manager: &ConversationManager<MemoryStore>) -> Vec<Conversation> {
    let (key, raw) = manager.store().writes().last().expect("a write").clone();
    assert_eq!(key, "chats");
    serde_json::from_str(&raw).expect("write holds a collection")
}

#[test]
fn model_list_selects_first_model() {
    let mut manager = create_test_manager();
    assert_eq!(manager.selected_model(), None);
    let selected = manager
        .set_available_models(vec![model("llama2"), model("mistral")], None)
        .map(str::to_string);
    assert_eq!(selected.as_deref(), Some("llama2"));
    assert_eq!(manager.available_models().len(), 2);
}

#[test]
fn model_list_keeps_existing_selection() {
    let mut manager = create_test_manager();
    assert!(manager.set_model("mistral"));
    manager.set_available_models(vec![model("llama2"), model("mistral")], None);
    assert_eq!(manager.selected_model(), Some("mistral"));
}

#[test]
fn failed_model_fetch_leaves_send_disabled() {
    let mut manager = create_test_manager();
    manager.set_available_models(Vec::new(), Some("llama2"));
    assert_eq!(manager.selected_model(), None);
    assert_eq!(manager.can_send("hello"), Err(SendRejection::NoModel));
    assert!(manager.begin_send("hello").is_err());
    assert!(manager.conversations().is_empty());
}

#[test]
fn create_adds_active_conversation_and_persists() {
    let mut manager = manager_with_model();
    let id = manager.create(None);

    assert_eq!(manager.active_id(), Some(id.as_str()));
    assert!(manager.view().is_empty());
    let conv = manager.active().expect("active");
    assert_eq!(conv.title, DEFAULT_CHAT_TITLE);
    assert_eq!(conv.model, "llama2");
    assert_eq!(manager.store().write_count(), 1);
    assert_eq!(last_write(&manager), manager.conversations().to_vec());
}

#[test]
fn created_ids_are_unique_within_the_same_millisecond() {
    let mut manager = manager_with_model();
    let ids: Vec<_> = (0..5).map(|_| manager.create(None)).collect();
    let mut deduped = ids.clone();
    deduped.sort();
    deduped.dedup();
    assert_eq!(deduped.len(), ids.len());
}

#[test]
fn select_loads_messages_and_model() {
    let mut manager = manager_with_model();
    let first = manager.create(Some("First".into()));
    manager.update(create_test_messages());

    let second = manager.create(None);
    assert!(manager.view().is_empty());
    manager.set_model("mistral");
    assert_eq!(manager.active().map(|c| c.model.as_str()), Some("mistral"));

    assert!(manager.select(&first));
    assert_eq!(manager.active_id(), Some(first.as_str()));
    assert_eq!(manager.view(), create_test_messages().as_slice());
    assert_eq!(manager.selected_model(), Some("llama2"));

    assert!(!manager.select("missing"));
    assert_eq!(manager.active_id(), Some(first.as_str()));
    assert_ne!(first, second);
}

#[test]
fn select_does_not_write() {
    let mut manager = manager_with_model();
    let id = manager.create(None);
    let writes = manager.store().write_count();
    manager.select(&id);
    assert_eq!(manager.store().write_count(), writes);
}

#[test]
fn deleting_active_conversation_clears_view() {
    let mut manager = manager_with_model();
    let id = manager.create(None);
    manager.update(create_test_messages());

    assert!(manager.delete(&id));
    assert_eq!(manager.active_id(), None);
    assert!(manager.view().is_empty());
    assert!(manager.conversations().is_empty());
    assert!(last_write(&manager).is_empty());
}

#[test]
fn deleting_other_conversation_keeps_view() {
    let mut manager = manager_with_model();
    let other = manager.create(None);
    let active = manager.create(None);
    manager.update(create_test_messages());

    assert!(manager.delete(&other));
    assert_eq!(manager.active_id(), Some(active.as_str()));
    assert_eq!(manager.view(), create_test_messages().as_slice());
    assert_eq!(manager.conversations().len(), 1);
    assert!(!manager.delete(&other));
}

#[test]
fn each_update_writes_full_collection_once() {
    let mut manager = manager_with_model();
    manager.create(Some("keep".into()));
    manager.create(None);
    let before = manager.store().write_count();

    let n = 4;
    let mut messages = Vec::new();
    for i in 0..n {
        messages.push(Message::user(format!("question {i}")));
        assert!(manager.update(messages.clone()));

        let written = last_write(&manager);
        assert_eq!(written.len(), 2);
        assert_eq!(written, manager.conversations().to_vec());
        assert_eq!(written[1].messages, messages);
    }
    assert_eq!(manager.store().write_count(), before + n);
}

#[test]
fn update_without_active_conversation_is_noop() {
    let mut manager = manager_with_model();
    assert!(!manager.update(create_test_messages()));
    assert_eq!(manager.store().write_count(), 0);
}

#[test]
fn update_refreshes_timestamp_and_derives_title() {
    let mut config = Config::default();
    config.ui.chat_title_max_length = 10;
    let mut manager = create_test_manager_with_config(&config);
    manager.set_model("llama2");
    manager.create(None);
    let created = manager.active().expect("active").updated_at;

    std::thread::sleep(std::time::Duration::from_millis(5));
    manager.update(vec![Message::user("Explain quicksort in detail please")]);

    let conv = manager.active().expect("active");
    assert_eq!(conv.title, "Explain qu...");
    assert!(conv.updated_at > created);
    assert_eq!(conv.created_at, created);
}

#[test]
fn user_title_is_not_replaced() {
    let mut manager = manager_with_model();
    manager.create(Some("Algorithms".into()));
    manager.update(vec![Message::user("Explain quicksort in detail please")]);
    assert_eq!(manager.active().expect("active").title, "Algorithms");
}

#[test]
fn rename_sets_custom_title() {
    let mut manager = manager_with_model();
    let id = manager.create(None);
    assert!(manager.rename(&id, "Renamed"));
    manager.update(vec![Message::user("hello")]);
    assert_eq!(manager.active().expect("active").title, "Renamed");
    assert!(!manager.rename(&id, "   "));
    assert!(!manager.rename("missing", "x"));
}

#[test]
fn can_send_rejects_empty_too_long_and_busy() {
    let mut config = Config::default();
    config.ui.max_message_length = 5;
    let mut manager = create_test_manager_with_config(&config);
    manager.set_model("llama2");

    assert_eq!(manager.can_send("   "), Err(SendRejection::EmptyInput));
    assert_eq!(
        manager.can_send("toolong"),
        Err(SendRejection::TooLong { max: 5, actual: 7 })
    );
    assert_eq!(manager.can_send("  héllo "), Ok(()));

    manager.begin_send("hi").expect("send");
    assert_eq!(manager.can_send("again"), Err(SendRejection::Busy));
}

#[test]
fn sending_hi_streams_hello() {
    let mut manager = manager_with_model();
    let ticket = manager.begin_send("hi").expect("send accepted");

    assert_eq!(ticket.model, "llama2");
    assert_eq!(ticket.api_messages.len(), 1);
    assert_eq!(ticket.api_messages[0].content, "hi");
    assert_eq!(
        manager.view(),
        &[Message::user("hi"), Message::assistant("")][..]
    );
    assert!(manager.is_streaming());

    assert!(manager.apply_chunk(ticket.stream_id, "Hel"));
    assert!(manager.apply_chunk(ticket.stream_id, "lo!"));
    assert!(manager.finish_stream(ticket.stream_id));

    assert!(!manager.is_streaming());
    let conv = manager.active().expect("active");
    assert_eq!(conv.messages.last(), Some(&Message::assistant("Hello!")));
    assert_eq!(conv.title, "hi...");
    assert_eq!(last_write(&manager)[0].messages, conv.messages);
}

#[test]
fn history_excludes_placeholder_and_includes_prior_turns() {
    let mut manager = manager_with_model();
    manager.create(None);
    manager.update(create_test_messages());

    let ticket = manager.begin_send("And then?").expect("send");
    let roles: Vec<_> = ticket.api_messages.iter().map(|m| m.role.as_str()).collect();
    assert_eq!(
        roles,
        vec!["user", "assistant", "user", "assistant", "user"]
    );
    assert_eq!(ticket.api_messages.last().map(|m| m.content.as_str()), Some("And then?"));
    assert_eq!(manager.view().len(), 6);
}

#[test]
fn final_content_is_concatenation_of_fragments() {
    let fragments = ["The ", "quick ", "", "brown ", "fox", " jumps", "\n```rust\n", "fn main() {}", "\n```"];
    let mut manager = manager_with_model();
    let ticket = manager.begin_send("story").expect("send");
    for fragment in fragments {
        manager.apply_chunk(ticket.stream_id, fragment);
    }
    manager.finish_stream(ticket.stream_id);

    let expected: String = fragments.concat();
    assert_eq!(
        manager.view().last().map(|m| m.content.clone()),
        Some(expected)
    );
}

#[test]
fn every_fragment_is_persisted() {
    let mut manager = manager_with_model();
    let ticket = manager.begin_send("hi").expect("send");
    let before = manager.store().write_count();
    manager.apply_chunk(ticket.stream_id, "a");
    manager.apply_chunk(ticket.stream_id, "b");
    assert_eq!(manager.store().write_count(), before + 2);
    assert_eq!(
        last_write(&manager)[0].messages.last(),
        Some(&Message::assistant("ab"))
    );
}

#[test]
fn request_failure_replaces_placeholder_with_notice() {
    let mut manager = manager_with_model();
    let ticket = manager.begin_send("hi").expect("send");

    assert!(manager.fail_stream(ticket.stream_id, "connection refused"));
    assert!(!manager.is_streaming());
    assert_eq!(
        manager.view().last(),
        Some(&Message::assistant(REQUEST_ERROR_MESSAGE))
    );
    assert_eq!(
        last_write(&manager)[0].messages.last(),
        Some(&Message::assistant(REQUEST_ERROR_MESSAGE))
    );
    // The trailing End after an error is ignored.
    assert!(!manager.finish_stream(ticket.stream_id));
}

#[test]
fn mid_stream_failure_keeps_partial_content() {
    let mut manager = manager_with_model();
    let ticket = manager.begin_send("hi").expect("send");
    manager.apply_chunk(ticket.stream_id, "Partial answer");
    manager.fail_stream(ticket.stream_id, "stream interrupted");

    let last = manager.view().last().expect("assistant message");
    assert!(last.content.starts_with("Partial answer\n\n"));
    assert!(last.content.ends_with(STREAM_INTERRUPTED_MARKER));
}

#[test]
fn switching_conversation_cancels_stream_and_rejects_late_fragments() {
    let mut manager = manager_with_model();
    let other = manager.create(Some("Other".into()));
    let streaming = manager.create(None);
    let ticket = manager.begin_send("hi").expect("send");
    manager.apply_chunk(ticket.stream_id, "Hel");

    assert!(manager.select(&other));
    assert!(ticket.cancel_token.is_cancelled());
    assert!(!manager.is_streaming());

    let writes = manager.store().write_count();
    assert!(!manager.apply_chunk(ticket.stream_id, "lo!"));
    assert!(!manager.fail_stream(ticket.stream_id, "late"));
    assert_eq!(manager.store().write_count(), writes);

    let kept = manager.conversation(&streaming).expect("still saved");
    assert_eq!(kept.messages.last(), Some(&Message::assistant("Hel")));
    assert!(manager.view().is_empty());
}

#[test]
fn switching_before_first_fragment_drops_empty_placeholder() {
    let mut manager = manager_with_model();
    let other = manager.create(Some("Other".into()));
    let streaming = manager.create(None);
    let ticket = manager.begin_send("hi").expect("send");

    let writes = manager.store().write_count();
    assert!(manager.select(&other));
    assert!(ticket.cancel_token.is_cancelled());
    assert_eq!(manager.store().write_count(), writes + 1);

    let saved = last_write(&manager);
    let abandoned = saved.iter().find(|c| c.id == streaming).expect("saved");
    assert_eq!(abandoned.messages, vec![Message::user("hi")]);

    assert!(manager.select(&streaming));
    let again = manager.begin_send("again").expect("send");
    let roles: Vec<&str> = again.api_messages.iter().map(|m| m.role.as_str()).collect();
    assert_eq!(roles, vec!["user", "user"]);
}

#[test]
fn creating_before_first_fragment_drops_empty_placeholder() {
    let mut manager = manager_with_model();
    let ticket = manager.begin_send("hi").expect("send");
    manager.create(None);

    let saved = last_write(&manager);
    let abandoned = saved
        .iter()
        .find(|c| c.id == ticket.conversation_id)
        .expect("saved");
    assert_eq!(abandoned.messages, vec![Message::user("hi")]);
    assert!(manager.view().is_empty());
}

#[test]
fn reselecting_streaming_conversation_keeps_stream() {
    let mut manager = manager_with_model();
    let ticket = manager.begin_send("hi").expect("send");
    let id = ticket.conversation_id.clone();
    assert!(manager.select(&id));
    assert!(!ticket.cancel_token.is_cancelled());
    assert!(manager.apply_chunk(ticket.stream_id, "ok"));
}

#[test]
fn deleting_streaming_conversation_cancels_stream() {
    let mut manager = manager_with_model();
    let ticket = manager.begin_send("hi").expect("send");
    assert!(manager.delete(&ticket.conversation_id));
    assert!(ticket.cancel_token.is_cancelled());
    assert!(!manager.apply_chunk(ticket.stream_id, "late"));
    assert!(manager.conversations().is_empty());
}

#[test]
fn stale_stream_id_is_rejected_after_new_send() {
    let mut manager = manager_with_model();
    let first = manager.begin_send("one").expect("send");
    manager.finish_stream(first.stream_id);
    let second = manager.begin_send("two").expect("send");
    assert!(second.stream_id > first.stream_id);
    assert!(!manager.apply_chunk(first.stream_id, "stale"));
    assert!(manager.apply_chunk(second.stream_id, "fresh"));
    assert_eq!(manager.view().last(), Some(&Message::assistant("fresh")));
}

#[test]
fn cancel_removes_untouched_placeholder() {
    let mut manager = manager_with_model();
    let ticket = manager.begin_send("hi").expect("send");
    assert!(manager.cancel_stream());
    assert!(ticket.cancel_token.is_cancelled());
    assert_eq!(manager.view(), &[Message::user("hi")][..]);
    assert!(!manager.cancel_stream());
}

#[test]
fn set_model_is_refused_while_streaming() {
    let mut manager = manager_with_model();
    manager.begin_send("hi").expect("send");
    assert!(!manager.set_model("mistral"));
    assert_eq!(manager.selected_model(), Some("llama2"));
}

#[test]
fn load_reads_existing_collection() {
    let mut seeded = manager_with_model();
    seeded.create(Some("Saved".into()));
    seeded.update(create_test_messages());
    let (_, raw) = seeded.store().writes().last().expect("write").clone();

    let manager = ConversationManager::load(MemoryStore::with_value("chats", &raw), &Config::default());
    assert_eq!(manager.conversations(), seeded.conversations());
    assert_eq!(manager.active_id(), None);
}
