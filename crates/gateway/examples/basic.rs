//! Basic example: guard a handful of operations with a shield.
//!
//! Run with: `cargo run -p bulwark-gateway --example basic`

use std::sync::Arc;

use bulwark_gateway::{Operation, OperationType, RuleTree, Shield, ShieldError};
use bulwark_rules::{and, chain, not, rule};

/// Request context handed to every rule.
#[derive(Debug)]
struct Session {
    user: Option<&'static str>,
    roles: Vec<&'static str>,
}

fn describe(result: &Result<&'static str, ShieldError>) -> String {
    match result {
        Ok(out) => format!("ran -> {out}"),
        Err(err) => format!("blocked -> {err}"),
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let is_authenticated = rule("isAuthenticated", |op: Operation<Session>| async move {
        op.ctx.user.is_some()
    });
    let is_editor = rule("isEditor", |op: Operation<Session>| async move {
        op.ctx.roles.contains(&"editor")
    });

    let tree: RuleTree<Session> = RuleTree::map([
        (
            "query",
            RuleTree::map([("feed", RuleTree::rule(is_authenticated.clone()))]),
        ),
        (
            "mutation",
            RuleTree::map([
                ("signUp", RuleTree::rule(not(is_authenticated.clone()))),
                (
                    "publish",
                    RuleTree::rule(chain([is_authenticated.clone(), is_editor.clone()])),
                ),
                ("deleteAll", RuleTree::rule(and([is_editor, is_authenticated]))),
            ]),
        ),
    ]);

    let shield = Shield::builder()
        .allow_external_errors(true)
        .build(tree)
        .expect("failed to build shield");

    let guest = Arc::new(Session {
        user: None,
        roles: vec![],
    });
    let editor = Arc::new(Session {
        user: Some("ada"),
        roles: vec!["editor"],
    });

    let requests = [
        ("guest", &guest, OperationType::Query, "feed"),
        ("guest", &guest, OperationType::Mutation, "signUp"),
        ("editor", &editor, OperationType::Query, "feed"),
        ("editor", &editor, OperationType::Mutation, "publish"),
        ("guest", &guest, OperationType::Mutation, "publish"),
        ("guest", &guest, OperationType::Subscription, "onPost"),
    ];

    println!("=== Dispatching operations ===");
    for (who, ctx, operation_type, path) in requests {
        let operation = Operation::new(Arc::clone(ctx), operation_type, path);
        let result = shield.dispatch(operation, || async { "handler" }).await;
        println!("  {who:<7} {operation_type:<13} {path:<10} {}", describe(&result));
    }
    println!();

    let snap = shield.metrics().snapshot();
    println!("=== Shield Metrics ===");
    println!("  Dispatched: {}", snap.dispatched);
    println!("  Allowed:    {}", snap.allowed);
    println!("  Denied:     {}", snap.denied);
    println!("  Fallbacks:  {}", snap.fallbacks);
}
