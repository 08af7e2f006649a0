//! Filter configuration loading tests
//!
//! Loads the documents under `tests/fixtures/configs/` through the public
//! API and checks the decisions they produce.

use gatekeep::{
    Action, ConfigError, Filter, FilterConfig, MatchError, Message, Param, RuleFault,
    UserContext,
};
use std::path::PathBuf;

fn config_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join("configs")
        .join(name)
}

fn inbound(sender: &str, text: &str, priority: i64) -> Message {
    Message::new()
        .with_sender(UserContext::new(10, sender, false))
        .with_receiver(UserContext::new(1, "me", false))
        .with_text(text)
        .with_priority(priority)
        .with_channel("ci")
}

fn outbound(receiver: UserContext, channel: &str) -> Message {
    Message::new()
        .with_sender(UserContext::new(1, "me", false))
        .with_receiver(receiver)
        .with_channel(channel)
        .with_outbound(true)
}

#[test]
fn yaml_and_json_documents_are_equivalent() {
    let yaml = FilterConfig::load(config_path("full.yaml")).unwrap();
    let json = FilterConfig::load(config_path("full.json")).unwrap();
    assert_eq!(yaml, json);
    assert_eq!(yaml.channels.len(), 2);
    assert!(!yaml.channels[1].public);
}

#[test]
fn sender_filter_decisions() {
    let config = FilterConfig::load(config_path("full.yaml"))
        .unwrap()
        .compile()
        .unwrap();

    assert!(!config.admit_inbound(&inbound("my_server", "[INFO] backup done", 5)));
    assert!(config.admit_inbound(&inbound("my_server", "[ERROR] backup failed", 5)));
    assert!(!config.admit_inbound(&inbound("alice", "low priority", 1)));
    assert!(config.admit_inbound(&inbound("alice", "hello", 2)));
}

#[test]
fn receiver_filter_decisions() {
    let config = FilterConfig::load(config_path("full.yaml"))
        .unwrap()
        .compile()
        .unwrap();
    let guest = UserContext::new(20, "guest", false);
    let admin = UserContext::new(2, "root", true);

    assert!(!config.admit_outbound(&outbound(guest.clone(), "homelab")));
    assert!(config.admit_outbound(&outbound(guest, "ci")));
    assert!(config.admit_outbound(&outbound(admin, "homelab")));
}

#[test]
fn compiled_filters_match_config_decisions() {
    let config = FilterConfig::load(config_path("full.yaml")).unwrap();
    let compiled = config.compile().unwrap();
    let sender = Filter::compile(&config.sender_filter).unwrap();
    let receiver = Filter::compile(&config.receiver_filter).unwrap();

    let messages = [
        inbound("my_server", "[DEBUG] tick", 5),
        inbound("bob", "[DEBUG] tick", 0),
        inbound("bob", "hi", 9),
        outbound(UserContext::new(3, "carol", false), "homelab"),
        outbound(UserContext::new(3, "carol", true), "homelab"),
    ];
    for msg in &messages {
        let filter = if msg.outbound { &receiver } else { &sender };
        let expected = config.chain_for(msg).evaluate(msg, Action::Accept);
        assert_eq!(filter.evaluate(msg, Action::Accept), expected);
        assert_eq!(compiled.decide(msg), expected);
        let admitted = if msg.outbound {
            compiled.admit_outbound(msg)
        } else {
            compiled.admit_inbound(msg)
        };
        assert_eq!(admitted, expected == Action::Accept);
    }
}

#[test]
fn invalid_document_reports_every_rule() {
    let err = FilterConfig::load(config_path("invalid.yaml")).unwrap_err();
    let ConfigError::ReceiverFilter(chain) = &err else {
        panic!("expected receiver filter error, got {err:?}");
    };
    assert_eq!(chain.indices(), vec![0, 2]);

    let (index, fault) = &chain.faults[0];
    assert_eq!(*index, 0);
    let RuleFault::Conditions(set) = fault else {
        panic!("expected condition fault, got {fault:?}");
    };
    assert_eq!(
        set.errors,
        vec![(
            0,
            MatchError::MissingParameter {
                field: Param::UserName
            }
        )]
    );

    let rule_two: Vec<_> = chain.faults.iter().filter(|(i, _)| *i == 2).collect();
    assert_eq!(rule_two.len(), 2);
    assert!(matches!(rule_two[0].1, RuleFault::InvalidAction { ref value } if value == "drop"));
    assert!(chain.to_string().contains("extra parameter(s): user_id"));
}

#[test]
fn unparseable_document() {
    let err = FilterConfig::from_yaml("sender_filter: {not: a list}").unwrap_err();
    assert!(matches!(err, ConfigError::Yaml(_)));

    let err = FilterConfig::from_json("{\"channels\": [").unwrap_err();
    assert!(matches!(err, ConfigError::Json(_)));
}

#[test]
fn default_document_round_trips_through_yaml() {
    let text = FilterConfig::default().to_yaml().unwrap();
    let parsed = FilterConfig::from_yaml(&text).unwrap();
    assert!(parsed.validate().is_ok());
    assert_eq!(parsed, FilterConfig::default());
}
