// provision/examples/basic_install.rs

use provision::{Action, Flavor, Platform, ProvisionError, Registry, RunEvent, RunState};
use tracing::{error, info};

#[derive(Clone, Debug, Default)]
struct HostState {
  downloads: Vec<String>,
  installed: Vec<String>,
}

#[derive(Debug, thiserror::Error)]
enum SetupError {
  #[error("Download failed: {0}")]
  Download(String),
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
  tracing_subscriber::fmt().with_max_level(tracing::Level::INFO).init();
  info!("--- Provision Basic Install Example ---");

  let registry = Registry::<HostState>::new();

  registry.register_step(|step| {
    step
      .name("vm")
      .description("create the development VM")
      .dep("downloads")
      .run(Action::sync(|state: &mut HostState| {
        state.installed.push("vm".to_string());
        Ok::<(), SetupError>(())
      }));
  })?;

  registry.register_step(|step| {
    step
      .name("downloads")
      .description("fetch queued downloads")
      .run(Action::deferred(|state: RunState<HostState>| async move {
        let pending = std::mem::take(&mut *state.map_write(|s| &mut s.downloads));
        for url in &pending {
          if url.is_empty() {
            return Err(SetupError::Download("empty URL".to_string()));
          }
          info!(%url, "Downloading.");
          tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        }
        Ok(())
      }));
  })?;

  registry.register_step(|step| {
    step
      .name("packages")
      .description("install host packages")
      .first()
      .darwin(Action::sync(|state: &mut HostState| {
        state.installed.push("brew bundle".to_string());
        Ok::<(), SetupError>(())
      }))
      .linux_flavor(
        Flavor::Debian,
        Action::sync(|state: &mut HostState| {
          state.installed.push("apt-get install".to_string());
          Ok::<(), SetupError>(())
        }),
      )
      .linux_flavor(
        Flavor::Fedora,
        Action::sync(|state: &mut HostState| {
          state.installed.push("dnf install".to_string());
          Ok::<(), SetupError>(())
        }),
      );
  })?;

  for platform in [Platform::Darwin, Platform::Win32, Platform::Linux(Flavor::Fedora)] {
    info!("Plan for {platform}:\n{}", registry.steps_for(platform)?);
  }

  let mut install = registry.installer_for(Platform::Darwin)?;
  install.on_event(|event: &RunEvent<'_, HostState>| match event {
    RunEvent::PreStep { step, .. } => info!(step = step.name(), "Starting: {}", step.description()),
    RunEvent::Error { error } => error!(%error, "Install failed."),
    _ => {}
  });

  let state = RunState::new(HostState {
    downloads: vec!["https://example.invalid/vm.iso".to_string()],
    ..Default::default()
  });
  let report = install.run(state.clone()).await?;
  info!(steps = report.steps_run(), "Install completed: {:?}", state.read().installed);
  assert_eq!(state.read().installed, vec!["brew bundle", "vm"]);

  // A failing step stops the run and names itself in the error.
  let failing = RunState::new(HostState {
    downloads: vec![String::new()],
    ..Default::default()
  });
  match install.run(failing).await {
    Err(ProvisionError::StepFailed { step_name, source, .. }) => {
      info!(%step_name, %source, "Failing install stopped as expected.");
      assert_eq!(step_name, "downloads");
    }
    other => error!("Unexpected outcome: {:?}", other),
  }

  Ok(())
}
