// tests/registry_tests.rs
mod common;

use async_trait::async_trait;
use common::*;
use provision::{Action, Platform, ProvisionError, ProvisionResult, Registry, RegistryOptions, StepDraft, StepPlugin};
use serial_test::serial;
use std::sync::atomic::Ordering;
use std::time::Duration;

#[test]
fn test_register_step_accepts_valid_step() {
  setup_tracing();
  let registry = Registry::<TestState>::new();
  register_simple(&registry, "download", &[]);
  assert_eq!(registry.len(), 1);
  assert!(registry.contains("download"));
}

#[test]
fn test_register_step_rejects_missing_description() {
  setup_tracing();
  let registry = Registry::<TestState>::new();
  let result = registry.register_step(|step| {
    step.name("nameless_work").run(append_name("x"));
  });
  match result {
    Err(ProvisionError::InvalidStep { step_name, message }) => {
      assert_eq!(step_name, "nameless_work");
      assert!(message.contains("description"));
    }
    other => panic!("Expected InvalidStep, got {:?}", other),
  }
  assert!(registry.is_empty());
}

#[test]
fn test_register_step_rejects_step_without_any_action() {
  setup_tracing();
  let registry = Registry::<TestState>::new();
  let result = registry.register_step(|step| {
    step.name("empty").description("does nothing anywhere");
  });
  assert!(matches!(result, Err(ProvisionError::InvalidStep { .. })));
  let message = result.unwrap_err().to_string();
  assert!(message.contains("empty"), "message should name the step: {message}");
}

#[test]
fn test_reregistering_a_name_replaces_the_step() {
  setup_tracing();
  let registry = Registry::<TestState>::new();
  register_simple(&registry, "dns", &[]);
  register_simple(&registry, "vm", &[]);
  registry
    .register_step(|step| {
      step.name("dns").description("redefined by a later plugin").dep("vm").run(append_name("D"));
    })
    .unwrap();

  assert_eq!(registry.step_names(), vec!["vm", "dns"]);
  let plan = registry.steps_for(Platform::Darwin).unwrap();
  assert_eq!(plan.names(), vec!["vm", "dns"]);
  assert_eq!(plan.steps()[1].description(), "redefined by a later plugin");
}

#[test]
fn test_clear_steps_empties_registry() {
  setup_tracing();
  let registry = scenario_registry();
  assert_eq!(registry.len(), 6);
  registry.clear_steps();
  assert!(registry.is_empty());
  assert!(registry.steps_for(Platform::Darwin).unwrap().is_empty());
}

#[tokio::test]
async fn test_register_step_async_waits_for_handler() {
  setup_tracing();
  let registry = Registry::<TestState>::new();
  registry
    .register_step_async(|mut step: StepDraft<TestState>| async move {
      // e.g. querying the installed VM provider before deciding on deps
      tokio::time::sleep(Duration::from_millis(5)).await;
      step.name("late").description("defined after a lookup").run(append_name("late"));
      Ok::<_, TestError>(step)
    })
    .await
    .unwrap();
  assert!(registry.contains("late"));
}

#[tokio::test]
async fn test_register_step_async_propagates_handler_error() {
  setup_tracing();
  let registry = Registry::<TestState>::new();
  let result = registry
    .register_step_async(|_step: StepDraft<TestState>| async move {
      Err::<StepDraft<TestState>, _>(TestError::Registration("lookup failed".to_string()))
    })
    .await;
  match result {
    Err(ProvisionError::RegistrationFailed { source }) => assert!(source.to_string().contains("lookup failed")),
    other => panic!("Expected RegistrationFailed, got {:?}", other),
  }
}

#[tokio::test(start_paused = true)]
async fn test_register_step_async_times_out() {
  setup_tracing();
  let registry = Registry::<TestState>::new();
  let result = registry
    .register_step_async(|_step: StepDraft<TestState>| async move {
      std::future::pending::<()>().await;
      Ok::<_, TestError>(StepDraft::new())
    })
    .await;
  match result {
    Err(ProvisionError::RegistrationTimeout { timeout }) => assert_eq!(timeout, Duration::from_secs(120)),
    other => panic!("Expected RegistrationTimeout, got {:?}", other),
  }
  assert!(registry.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_registration_timeout_is_configurable() {
  setup_tracing();
  let registry = Registry::<TestState>::with_options(RegistryOptions {
    registration_timeout: Duration::from_secs(1),
  });
  let result = registry
    .register_step_async(|mut step: StepDraft<TestState>| async move {
      tokio::time::sleep(Duration::from_secs(5)).await;
      step.name("slow").description("too slow").run(append_name("slow"));
      Ok::<_, TestError>(step)
    })
    .await;
  assert!(matches!(result, Err(ProvisionError::RegistrationTimeout { timeout }) if timeout == Duration::from_secs(1)));
}

// --- Plugins ---

struct DnsPlugin;

#[async_trait]
impl StepPlugin<TestState> for DnsPlugin {
  fn name(&self) -> &str {
    "dns"
  }

  async fn register(&self, registry: &Registry<TestState>) -> ProvisionResult<()> {
    PLUGIN_LOAD_COUNTER.fetch_add(1, Ordering::SeqCst);
    registry.register_step(|step| {
      step
        .name("resolver")
        .description("point the host resolver at the local DNS service")
        .darwin(append_name("resolver"))
        .linux(append_name("resolver"));
    })?;
    registry
      .register_step_async(|mut step: StepDraft<TestState>| async move {
        step
          .name("dns_image")
          .description("pull the DNS container image")
          .subscribe("resolver")
          .run(Action::deferred(|state: provision::RunState<TestState>| async move {
            state.write().downloads.push("dns-image".to_string());
            Ok::<(), TestError>(())
          }));
        Ok::<_, TestError>(step)
      })
      .await
  }
}

#[tokio::test]
#[serial]
async fn test_load_plugin_registers_its_steps() {
  setup_tracing();
  PLUGIN_LOAD_COUNTER.store(0, Ordering::SeqCst);
  let registry = Registry::<TestState>::new();
  registry.load_plugin(&DnsPlugin).await.unwrap();

  assert_eq!(PLUGIN_LOAD_COUNTER.load(Ordering::SeqCst), 1);
  assert_eq!(registry.step_names(), vec!["resolver", "dns_image"]);

  let darwin = registry.steps_for(Platform::Darwin).unwrap();
  assert_eq!(darwin.names(), vec!["dns_image", "resolver"]);

  let windows = registry.steps_for(Platform::Win32).unwrap();
  assert_eq!(windows.names(), vec!["dns_image"]);
}

#[tokio::test]
#[serial]
async fn test_loading_a_plugin_twice_redefines_instead_of_duplicating() {
  setup_tracing();
  PLUGIN_LOAD_COUNTER.store(0, Ordering::SeqCst);
  let registry = Registry::<TestState>::new();
  registry.load_plugin(&DnsPlugin).await.unwrap();
  registry.load_plugin(&DnsPlugin).await.unwrap();

  assert_eq!(PLUGIN_LOAD_COUNTER.load(Ordering::SeqCst), 2);
  assert_eq!(registry.len(), 2);
}

/// Fails while probing the host, before registering anything.
struct HostCheckPlugin;

#[async_trait]
impl StepPlugin<TestState> for HostCheckPlugin {
  fn name(&self) -> &str {
    "host_check"
  }

  async fn register(&self, _registry: &Registry<TestState>) -> ProvisionResult<()> {
    let host_check: anyhow::Result<()> = Err(anyhow::anyhow!("virtualization is disabled in firmware"));
    host_check?;
    Ok(())
  }
}

/// Registers through an anyhow-returning helper that hits a validation error.
struct SloppyPlugin;

fn register_undescribed(registry: &Registry<TestState>) -> anyhow::Result<()> {
  registry.register_step(|step| {
    step.name("sloppy").run(append_name("sloppy"));
  })?;
  Ok(())
}

#[async_trait]
impl StepPlugin<TestState> for SloppyPlugin {
  fn name(&self) -> &str {
    "sloppy"
  }

  async fn register(&self, registry: &Registry<TestState>) -> ProvisionResult<()> {
    register_undescribed(registry)?;
    Ok(())
  }
}

#[tokio::test]
async fn test_plugin_anyhow_error_becomes_handler_error() {
  setup_tracing();
  let registry = Registry::<TestState>::new();
  let err = registry.load_plugin(&HostCheckPlugin).await.unwrap_err();
  match err {
    ProvisionError::HandlerError { source } => {
      assert_eq!(source.to_string(), "virtualization is disabled in firmware");
    }
    other => panic!("Expected HandlerError, got {:?}", other),
  }
  assert!(registry.is_empty());
}

#[tokio::test]
async fn test_plugin_provision_error_is_not_nested() {
  setup_tracing();
  let registry = Registry::<TestState>::new();
  let err = registry.load_plugin(&SloppyPlugin).await.unwrap_err();
  match err {
    ProvisionError::InvalidStep { step_name, message } => {
      assert_eq!(step_name, "sloppy");
      assert!(message.contains("description"));
    }
    other => panic!("Expected InvalidStep, got {:?}", other),
  }
}
