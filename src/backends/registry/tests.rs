use super::*;
use crate::backends::memory::MemoryBackend;
use clap::Arg;

fn inputs_with<'a>(ctx: &'a Context, env: &'a Environment) -> BackendInputs<'a> {
    BackendInputs {
        ctx,
        env,
        flags: None,
    }
}

#[test]
fn defaults_register_launchdarkly() {
    let registry = BackendRegistry::with_defaults();
    assert_eq!(registry.names(), vec!["launchdarkly".to_string()]);

    let groups = registry.flag_groups();
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].name, "LaunchDarkly Backend");
}

#[test]
fn unknown_backend_is_unsupported() {
    let registry = BackendRegistry::with_defaults();
    let ctx = Context::background();
    let env = Environment::empty();

    let err = registry
        .create("nope", &inputs_with(&ctx, &env))
        .err()
        .expect("unsupported");
    assert!(matches!(err, FlagonError::UnsupportedBackend(ref name) if name == "nope"));
    assert_eq!(err.to_string(), "unsupported backend: nope");
}

#[test]
fn empty_registry_rejects_every_name() {
    let registry = BackendRegistry::new();
    let ctx = Context::background();
    let env = Environment::empty();
    assert!(registry.create("launchdarkly", &inputs_with(&ctx, &env)).is_err());
    assert!(registry.flag_groups().is_empty());
}

#[test]
fn registered_factory_is_called_with_inputs() {
    let mut registry = BackendRegistry::new();
    registry.register("memory", FlagGroup::new("Memory Backend"), |inputs| {
        let enabled = inputs.env.get("MEMORY_ENABLED") == Some("1");
        Ok(Arc::new(MemoryBackend::new().with_flag("a", enabled, &[])) as Arc<dyn Backend>)
    });

    let ctx = Context::background();
    let env = Environment::empty().with("MEMORY_ENABLED", "1");
    let backend = registry
        .create("memory", &inputs_with(&ctx, &env))
        .expect("created");

    assert_eq!(backend.name(), "memory");
    assert!(backend.get_flag(&ctx, "a").expect("flag").enabled);
}

#[test]
fn re_registering_replaces_in_place() {
    let mut registry = BackendRegistry::new();
    registry.register("first", FlagGroup::new("First"), |_| {
        Ok(Arc::new(MemoryBackend::new()) as Arc<dyn Backend>)
    });
    registry.register("second", FlagGroup::new("Second"), |_| {
        Ok(Arc::new(MemoryBackend::new()) as Arc<dyn Backend>)
    });
    registry.register(
        "first",
        FlagGroup::new("First v2").arg(Arg::new("x").long("x")),
        |_| Ok(Arc::new(MemoryBackend::new()) as Arc<dyn Backend>),
    );

    assert_eq!(registry.names(), vec!["first", "second"]);
    let groups = registry.flag_groups();
    assert_eq!(groups[0].name, "First v2");
    assert!(groups[0].usage().contains("--x"));
}

#[test]
fn launchdarkly_without_token_fails_configuration() {
    let registry = BackendRegistry::with_defaults();
    let ctx = Context::background();
    let env = Environment::empty();

    let err = registry
        .create("launchdarkly", &inputs_with(&ctx, &env))
        .err()
        .expect("missing token");
    assert!(matches!(err, FlagonError::BackendConfig(_)));
}
