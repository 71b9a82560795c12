mod common;

use common::{
    harness, harness_with_provider, harness_with_saver, BrokenSaver, EchoAgent, FailingAgent,
    FlakySaver, SilentAgent,
};
use futures::future::join_all;
use parley_api::service::{FALLBACK_REPLY, NO_RESPONSE_REPLY};
use parley_api::{ChatError, HistoryMessage, HistoryRole};
use parley_checkpoint::{
    Backend, Checkpoint, CheckpointSaver, CheckpointerConfig, CheckpointerProvider, SqliteSaver,
};
use parley_graph::Outcome;
use parley_llm::Message;
use parley_persist::{NewUser, PersistenceClient};
use std::sync::Arc;
use std::time::Duration;

fn user(content: &str) -> HistoryMessage {
    HistoryMessage {
        role: HistoryRole::User,
        content: content.to_string(),
    }
}

fn assistant(content: &str) -> HistoryMessage {
    HistoryMessage {
        role: HistoryRole::Assistant,
        content: content.to_string(),
    }
}

#[tokio::test]
async fn test_new_chat_has_empty_history_and_stored_title() {
    let h = harness(Arc::new(EchoAgent::default())).await;
    let thread = h
        .service
        .create_chat(h.user.id, Some("Trip planning".to_string()))
        .await
        .unwrap();

    let history = h.service.get_history(&thread).await;

    assert!(!history.is_degraded());
    let history = history.into_inner();
    assert!(history.messages.is_empty());
    assert_eq!(history.title.as_deref(), Some("Trip planning"));
    assert_eq!(history.thread_id, thread.thread_id);
}

#[tokio::test]
async fn test_two_turn_conversation() {
    let h = harness(Arc::new(EchoAgent::default())).await;
    let mut thread = h.service.create_chat(h.user.id, None).await.unwrap();

    let reply = h
        .service
        .append_and_run(&mut thread, h.user.id, "Hello")
        .await
        .unwrap();
    assert_eq!(reply, Outcome::Completed("echo: Hello".to_string()));
    assert_eq!(thread.title.as_deref(), Some("Hello..."));

    let history = h.service.get_history(&thread).await.into_inner();
    assert_eq!(history.messages, vec![user("Hello"), assistant("echo: Hello")]);

    h.service
        .append_and_run(&mut thread, h.user.id, "How are you")
        .await
        .unwrap();

    let stored = h.persist.get_thread(thread.id).await.unwrap().unwrap();
    assert_eq!(stored.title.as_deref(), Some("Hello..."));

    let history = h.service.get_history(&thread).await.into_inner();
    assert_eq!(
        history.messages,
        vec![
            user("Hello"),
            assistant("echo: Hello"),
            user("How are you"),
            assistant("echo: How are you"),
        ]
    );
}

#[tokio::test]
async fn test_first_message_keeps_explicit_title() {
    let h = harness(Arc::new(EchoAgent::default())).await;
    let mut thread = h
        .service
        .create_chat(h.user.id, Some("Named".to_string()))
        .await
        .unwrap();

    h.service
        .append_and_run(&mut thread, h.user.id, "A long first message about many things")
        .await
        .unwrap();

    let stored = h.persist.get_thread(thread.id).await.unwrap().unwrap();
    assert_eq!(stored.title.as_deref(), Some("Named"));
}

#[tokio::test]
async fn test_pipeline_receives_stored_messages_plus_new_one() {
    let agent = Arc::new(EchoAgent::default());
    let h = harness(agent.clone()).await;
    let mut thread = h.service.create_chat(h.user.id, None).await.unwrap();

    h.service
        .append_and_run(&mut thread, h.user.id, "Hello")
        .await
        .unwrap();
    h.service
        .append_and_run(&mut thread, h.user.id, "Again")
        .await
        .unwrap();

    let inputs = agent.inputs();
    assert_eq!(inputs.len(), 2);
    assert_eq!(inputs[0], vec![Message::human("Hello")]);
    assert_eq!(
        inputs[1],
        vec![
            Message::human("Hello"),
            Message::ai("echo: Hello"),
            Message::human("Again"),
        ]
    );
}

#[tokio::test]
async fn test_send_updates_activity_time() {
    let h = harness(Arc::new(EchoAgent::default())).await;
    let mut thread = h.service.create_chat(h.user.id, None).await.unwrap();
    let created = thread.updated_at;

    tokio::time::sleep(Duration::from_millis(5)).await;
    h.service
        .append_and_run(&mut thread, h.user.id, "Hello")
        .await
        .unwrap();

    let stored = h.persist.get_thread(thread.id).await.unwrap().unwrap();
    assert!(stored.updated_at > created);
}

#[tokio::test]
async fn test_pipeline_failure_returns_fallback_reply() {
    let h = harness(Arc::new(FailingAgent)).await;
    let mut thread = h.service.create_chat(h.user.id, None).await.unwrap();

    let reply = h
        .service
        .append_and_run(&mut thread, h.user.id, "Hello")
        .await
        .unwrap();

    assert!(reply.is_degraded());
    assert_eq!(reply.value(), FALLBACK_REPLY);

    // registry write happens before the run, the checkpoint is untouched
    let stored = h.persist.get_thread(thread.id).await.unwrap().unwrap();
    assert_eq!(stored.title.as_deref(), Some("Hello..."));
    assert!(h.saver.get(&thread.thread_id).await.unwrap().is_none());
}

#[tokio::test]
async fn test_run_without_reply_returns_sentinel() {
    let h = harness(Arc::new(SilentAgent)).await;
    let mut thread = h.service.create_chat(h.user.id, None).await.unwrap();

    // an earlier assistant message must not be mistaken for this run's reply
    h.saver
        .put(
            &thread.thread_id,
            &Checkpoint::new(vec![Message::human("Hi"), Message::ai("Old reply")]),
        )
        .await
        .unwrap();

    let reply = h
        .service
        .append_and_run(&mut thread, h.user.id, "Anyone there?")
        .await
        .unwrap();

    assert!(reply.is_degraded());
    assert_eq!(reply.value(), NO_RESPONSE_REPLY);
}

#[tokio::test]
async fn test_unreadable_checkpoint_degrades_history_to_empty() {
    let h = harness_with_saver(Arc::new(EchoAgent::default()), Arc::new(BrokenSaver)).await;
    let thread = h
        .service
        .create_chat(h.user.id, Some("Kept".to_string()))
        .await
        .unwrap();

    let history = h.service.get_history(&thread).await;

    assert!(history.is_degraded());
    let history = history.into_inner();
    assert!(history.messages.is_empty());
    assert_eq!(history.title.as_deref(), Some("Kept"));
}

#[tokio::test]
async fn test_failed_checkpoint_write_returns_fallback_reply() {
    let agent = Arc::new(EchoAgent::default());
    let h = harness_with_saver(agent.clone(), Arc::new(FlakySaver::failing_writes())).await;
    let mut thread = h.service.create_chat(h.user.id, None).await.unwrap();

    let reply = h
        .service
        .append_and_run(&mut thread, h.user.id, "Hello")
        .await
        .unwrap();

    assert!(reply.is_degraded());
    assert_eq!(reply.value(), FALLBACK_REPLY);
    assert_eq!(agent.inputs().len(), 1);
    assert!(h.saver.get(&thread.thread_id).await.unwrap().is_none());
}

#[tokio::test]
async fn test_store_read_failure_skips_run_and_keeps_history() {
    let agent = Arc::new(EchoAgent::default());
    let h = harness_with_saver(agent.clone(), Arc::new(FlakySaver::failing_read(2))).await;
    let mut thread = h.service.create_chat(h.user.id, None).await.unwrap();

    let first = h
        .service
        .append_and_run(&mut thread, h.user.id, "Hello")
        .await
        .unwrap();
    assert_eq!(first, Outcome::Completed("echo: Hello".to_string()));

    let second = h
        .service
        .append_and_run(&mut thread, h.user.id, "Second")
        .await
        .unwrap();
    assert!(second.is_degraded());
    assert_eq!(second.value(), FALLBACK_REPLY);
    assert!(second.reason().unwrap().contains("connection reset"));

    // the pipeline never saw the second message and nothing was overwritten
    assert_eq!(agent.inputs().len(), 1);
    let stored = h.saver.get(&thread.thread_id).await.unwrap().unwrap();
    assert_eq!(
        stored.messages,
        vec![Message::human("Hello"), Message::ai("echo: Hello")]
    );

    h.service
        .append_and_run(&mut thread, h.user.id, "Third")
        .await
        .unwrap();
    let history = h.service.get_history(&thread).await.into_inner();
    assert_eq!(
        history.messages,
        vec![
            user("Hello"),
            assistant("echo: Hello"),
            user("Third"),
            assistant("echo: Third"),
        ]
    );
}

#[tokio::test]
async fn test_malformed_checkpoint_is_replaced_by_next_run() {
    let saver = SqliteSaver::connect("sqlite::memory:").await.unwrap();
    let pool = saver.pool().clone();
    let h = harness_with_saver(Arc::new(EchoAgent::default()), Arc::new(saver)).await;
    let mut thread = h.service.create_chat(h.user.id, None).await.unwrap();

    sqlx::query("INSERT INTO checkpoints (thread_id, payload, updated_at) VALUES (?, ?, ?)")
        .bind(&thread.thread_id)
        .bind("{not json")
        .bind(chrono::Utc::now())
        .execute(&pool)
        .await
        .unwrap();

    assert!(h.service.get_history(&thread).await.is_degraded());

    let reply = h
        .service
        .append_and_run(&mut thread, h.user.id, "Fresh start")
        .await
        .unwrap();
    assert!(reply.is_degraded());
    assert_eq!(reply.value(), "echo: Fresh start");
    assert!(reply.reason().unwrap().starts_with("checkpoint_read"));

    let history = h.service.get_history(&thread).await;
    assert!(!history.is_degraded());
    assert_eq!(
        history.into_inner().messages,
        vec![user("Fresh start"), assistant("echo: Fresh start")]
    );
}

#[tokio::test]
async fn test_foreign_roles_survive_in_history() {
    let saver = SqliteSaver::connect("sqlite::memory:").await.unwrap();
    let pool = saver.pool().clone();
    let agent = Arc::new(EchoAgent::default());
    let h = harness_with_saver(agent.clone(), Arc::new(saver)).await;
    let mut thread = h.service.create_chat(h.user.id, None).await.unwrap();

    let payload = r#"{"messages":[
        {"role":"user","content":"What is 6x7?"},
        {"role":"tool","content":"42"},
        {"role":"assistant","content":"It is 42."}
    ],"updated_at":"2024-05-01T10:00:00Z"}"#;
    sqlx::query("INSERT INTO checkpoints (thread_id, payload, updated_at) VALUES (?, ?, ?)")
        .bind(&thread.thread_id)
        .bind(payload)
        .bind(chrono::Utc::now())
        .execute(&pool)
        .await
        .unwrap();

    let history = h.service.get_history(&thread).await;
    assert!(!history.is_degraded());
    let messages = history.into_inner().messages;
    assert_eq!(messages.len(), 3);
    assert_eq!(
        messages[1],
        HistoryMessage {
            role: HistoryRole::Unknown,
            content: "42".to_string(),
        }
    );

    let reply = h
        .service
        .append_and_run(&mut thread, h.user.id, "Thanks")
        .await
        .unwrap();
    assert_eq!(reply, Outcome::Completed("echo: Thanks".to_string()));

    let tool = Message::Unknown {
        role: "tool".to_string(),
        content: "42".to_string(),
    };
    assert_eq!(agent.inputs()[0][1], tool);
    let stored = h.saver.get(&thread.thread_id).await.unwrap().unwrap();
    assert_eq!(stored.messages.len(), 5);
    assert_eq!(stored.messages[1], tool);
}

#[tokio::test]
async fn test_chats_do_not_share_history() {
    let h = harness(Arc::new(EchoAgent::slow(Duration::from_millis(5)))).await;

    let mut threads = Vec::new();
    for _ in 0..5 {
        threads.push(h.service.create_chat(h.user.id, None).await.unwrap());
    }

    let service = &h.service;
    let user_id = h.user.id;
    let runs = threads.iter_mut().enumerate().map(move |(i, thread)| async move {
        service
            .append_and_run(thread, user_id, &format!("chat {i}"))
            .await
            .unwrap()
    });
    join_all(runs).await;

    for (i, thread) in threads.iter().enumerate() {
        let history = h.service.get_history(thread).await.into_inner();
        let expected = format!("chat {i}");
        assert_eq!(
            history.messages,
            vec![user(&expected), assistant(&format!("echo: {expected}"))]
        );
    }
}

#[tokio::test]
async fn test_concurrent_sends_on_one_chat_lose_nothing() {
    let h = harness(Arc::new(EchoAgent::slow(Duration::from_millis(5)))).await;
    let thread = h.service.create_chat(h.user.id, None).await.unwrap();

    // each request carries its own copy of the row, as separate HTTP calls would
    let mut copies: Vec<_> = (0..8).map(|_| thread.clone()).collect();
    let service = &h.service;
    let user_id = h.user.id;
    let runs = copies.iter_mut().enumerate().map(move |(i, copy)| async move {
        service
            .append_and_run(copy, user_id, &format!("msg {i}"))
            .await
            .unwrap()
    });
    let replies = join_all(runs).await;
    assert!(replies.iter().all(|r| !r.is_degraded()));

    let messages = h.service.get_history(&thread).await.into_inner().messages;
    assert_eq!(messages.len(), 16);

    // every turn lands as an adjacent user/assistant pair
    for pair in messages.chunks(2) {
        assert_eq!(pair[0].role, HistoryRole::User);
        assert_eq!(pair[1], assistant(&format!("echo: {}", pair[0].content)));
    }
    for i in 0..8 {
        assert!(messages.contains(&user(&format!("msg {i}"))));
    }

    // the title derived by the first run survives the later ones
    let stored = h.persist.get_thread(thread.id).await.unwrap().unwrap();
    let title = stored.title.unwrap();
    assert!(title.starts_with("msg ") && title.ends_with("..."));
}

#[tokio::test]
async fn test_unreachable_durable_store_falls_back_to_memory() {
    let dir = tempfile::tempdir().unwrap();
    let url = format!("sqlite://{}/missing/checkpoints.db", dir.path().display());
    let provider = Arc::new(CheckpointerProvider::new(CheckpointerConfig::sqlite(url)).unwrap());

    let h = harness_with_provider(Arc::new(EchoAgent::default()), provider).await;
    assert_eq!(h.service.checkpoint_backend().await, Backend::Memory);

    let mut thread = h.service.create_chat(h.user.id, None).await.unwrap();
    h.service
        .append_and_run(&mut thread, h.user.id, "Still here?")
        .await
        .unwrap();

    let history = h.service.get_history(&thread).await.into_inner();
    assert_eq!(
        history.messages,
        vec![user("Still here?"), assistant("echo: Still here?")]
    );
}

#[tokio::test]
async fn test_authorize() {
    let h = harness(Arc::new(EchoAgent::default())).await;
    let other = h
        .persist
        .create_user(NewUser::new("bruno"))
        .await
        .unwrap();
    let thread = h.service.create_chat(h.user.id, None).await.unwrap();

    let found = h.service.authorize(thread.id, h.user.id).await.unwrap();
    assert_eq!(found.thread_id, thread.thread_id);

    assert!(matches!(
        h.service.authorize(thread.id, other.id).await,
        Err(ChatError::Forbidden(id)) if id == thread.id
    ));
    assert!(matches!(
        h.service.authorize(9999, h.user.id).await,
        Err(ChatError::ThreadNotFound(9999))
    ));
}

#[tokio::test]
async fn test_deleted_chat_is_hidden_but_checkpoint_kept() {
    let h = harness(Arc::new(EchoAgent::default())).await;
    let mut thread = h.service.create_chat(h.user.id, None).await.unwrap();
    h.service
        .append_and_run(&mut thread, h.user.id, "Hello")
        .await
        .unwrap();

    h.service.delete_chat(&thread).await.unwrap();

    assert!(matches!(
        h.service.authorize(thread.id, h.user.id).await,
        Err(ChatError::ThreadNotFound(_))
    ));
    assert!(h
        .service
        .list_chats(h.user.id, None, None)
        .await
        .unwrap()
        .is_empty());

    assert!(h.saver.get(&thread.thread_id).await.unwrap().is_some());
    assert_eq!(
        h.persist.list_deleted_thread_tokens().await.unwrap(),
        vec![thread.thread_id.clone()]
    );
}

#[tokio::test]
async fn test_rename_chat() {
    let h = harness(Arc::new(EchoAgent::default())).await;
    let thread = h.service.create_chat(h.user.id, None).await.unwrap();

    let renamed = h.service.rename_chat(&thread, "Renamed").await.unwrap();
    assert_eq!(renamed.title.as_deref(), Some("Renamed"));

    let stored = h.persist.get_thread(thread.id).await.unwrap().unwrap();
    assert_eq!(stored.title.as_deref(), Some("Renamed"));
}

#[tokio::test]
async fn test_rename_after_delete_does_not_restore_chat() {
    let h = harness(Arc::new(EchoAgent::default())).await;
    let thread = h.service.create_chat(h.user.id, None).await.unwrap();

    // two requests authorized before either one wrote
    let copy_a = h.service.authorize(thread.id, h.user.id).await.unwrap();
    let copy_b = h.service.authorize(thread.id, h.user.id).await.unwrap();

    h.service.delete_chat(&copy_a).await.unwrap();
    assert!(matches!(
        h.service.rename_chat(&copy_b, "Back again").await,
        Err(ChatError::ThreadNotFound(id)) if id == thread.id
    ));
    assert!(matches!(
        h.service.delete_chat(&copy_b).await,
        Err(ChatError::ThreadNotFound(_))
    ));

    let stored = h.persist.get_thread(thread.id).await.unwrap().unwrap();
    assert!(stored.is_deleted);
    assert!(stored.title.is_none());
    assert!(h
        .service
        .list_chats(h.user.id, None, None)
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn test_send_after_delete_is_rejected() {
    let agent = Arc::new(EchoAgent::default());
    let h = harness(agent.clone()).await;
    let thread = h.service.create_chat(h.user.id, None).await.unwrap();
    let mut stale = thread.clone();

    h.service.delete_chat(&thread).await.unwrap();

    assert!(matches!(
        h.service.append_and_run(&mut stale, h.user.id, "Hello").await,
        Err(ChatError::ThreadNotFound(id)) if id == thread.id
    ));
    assert!(agent.inputs().is_empty());
    assert!(h.saver.get(&thread.thread_id).await.unwrap().is_none());

    let stored = h.persist.get_thread(thread.id).await.unwrap().unwrap();
    assert!(stored.is_deleted);
    assert!(stored.title.is_none());
}

#[tokio::test]
async fn test_send_queued_behind_a_delete_is_rejected() {
    let agent = Arc::new(EchoAgent::slow(Duration::from_millis(100)));
    let h = harness(agent.clone()).await;
    let thread = h.service.create_chat(h.user.id, None).await.unwrap();
    let mut copy_a = thread.clone();
    let mut copy_b = thread.clone();

    let service = &h.service;
    let user_id = h.user.id;
    let (first, _, second) = tokio::join!(
        service.append_and_run(&mut copy_a, user_id, "first"),
        async {
            tokio::time::sleep(Duration::from_millis(30)).await;
            service.delete_chat(&thread).await.unwrap();
        },
        async {
            // queues on the chat lock while the first run is still going
            tokio::time::sleep(Duration::from_millis(10)).await;
            service.append_and_run(&mut copy_b, user_id, "second").await
        },
    );

    assert_eq!(first.unwrap(), Outcome::Completed("echo: first".to_string()));
    assert!(matches!(second, Err(ChatError::ThreadNotFound(_))));
    assert_eq!(agent.inputs().len(), 1);

    let stored = h.saver.get(&thread.thread_id).await.unwrap().unwrap();
    assert_eq!(stored.messages.len(), 2);
}
