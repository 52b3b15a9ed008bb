// provision/examples/plugin_subscription.rs

use async_trait::async_trait;
use provision::{Action, Platform, ProvisionResult, Registry, RunState, StepDraft, StepPlugin};
use tracing::info;

#[derive(Clone, Debug, Default)]
struct EnvState {
  log: Vec<String>,
}

fn record(entry: &'static str) -> Action<EnvState> {
  Action::sync(move |state: &mut EnvState| {
    info!(entry, "Running step.");
    state.log.push(entry.to_string());
    Ok::<(), anyhow::Error>(())
  })
}

/// Owns the VM lifecycle.
struct VmPlugin;

#[async_trait]
impl StepPlugin<EnvState> for VmPlugin {
  fn name(&self) -> &str {
    "vm"
  }

  async fn register(&self, registry: &Registry<EnvState>) -> ProvisionResult<()> {
    registry.register_step(|step| {
      step.name("vm_create").description("create the VM").run(record("vm_create"));
    })?;
    registry.register_step(|step| {
      step
        .name("vm_start")
        .description("boot the VM")
        .dep("vm_create")
        .run(record("vm_start"));
    })?;
    Ok(())
  }
}

/// Knows nothing about the VM plugin's internals, but its resolver config
/// has to be in place before the VM is created.
struct DnsPlugin;

#[async_trait]
impl StepPlugin<EnvState> for DnsPlugin {
  fn name(&self) -> &str {
    "dns"
  }

  async fn register(&self, registry: &Registry<EnvState>) -> ProvisionResult<()> {
    registry
      .register_step_async(|mut step: StepDraft<EnvState>| async move {
        // Stand-in for reading the resolver configuration from disk.
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        step
          .name("dns_config")
          .description("write resolver configuration")
          .subscribe("vm_create")
          .run(record("dns_config"));
        Ok::<_, anyhow::Error>(step)
      })
      .await
  }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
  tracing_subscriber::fmt().with_max_level(tracing::Level::INFO).init();
  info!("--- Provision Plugin Subscription Example ---");

  let registry = Registry::<EnvState>::new();
  let plugins: Vec<Box<dyn StepPlugin<EnvState>>> = vec![Box::new(VmPlugin), Box::new(DnsPlugin)];
  for plugin in &plugins {
    registry.load_plugin(plugin.as_ref()).await?;
  }

  let platform = Platform::current()?;
  let plan = registry.steps_for(platform)?;
  info!("Plan for {platform}:\n{plan}");
  assert_eq!(plan.names(), vec!["dns_config", "vm_create", "vm_start"]);

  let state = RunState::new(EnvState::default());
  registry.installer_for(platform)?.run(state.clone()).await?;
  info!("Run log: {:?}", state.read().log);

  Ok(())
}
