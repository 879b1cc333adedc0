// Call capability and the optional pre-call side-effect hook.

use tokio::process::Command;

use crate::core::error::PlacementError;

pub trait Dialer: Send {
    fn place_call(&mut self, number: &str) -> Result<(), PlacementError>;
}

/// Runs before every placed call, e.g. to collapse a notification shade on
/// platforms that need it. No-op by default.
pub trait CallStartHook: Send {
    fn before_call(&mut self, number: &str);
}

pub struct NoopHook;

impl CallStartHook for NoopHook {
    fn before_call(&mut self, _number: &str) {}
}

/// Places calls by running an external command, e.g.
/// `["adb", "shell", "am", "start", "-a", "android.intent.action.CALL", "-d", "tel:{number}"]`.
/// `{number}` is substituted in every argument.
///
/// The command is launched and left running; its exit status is only logged.
/// Must be called from within a tokio runtime.
pub struct CommandDialer {
    template: Vec<String>,
}

impl CommandDialer {
    pub fn new(template: Vec<String>) -> Self {
        Self { template }
    }

    fn argv(&self, number: &str) -> Vec<String> {
        self.template
            .iter()
            .map(|arg| arg.replace("{number}", number))
            .collect()
    }
}

impl Dialer for CommandDialer {
    fn place_call(&mut self, number: &str) -> Result<(), PlacementError> {
        let argv = self.argv(number);
        let (program, args) = argv.split_first().ok_or(PlacementError::NotConfigured)?;

        log::info!("Dialing {} via {}", number, program);
        let mut child = Command::new(program).args(args).spawn()?;

        let program = program.clone();
        tokio::spawn(async move {
            match child.wait().await {
                Ok(status) if status.success() => log::debug!("{} finished", program),
                Ok(status) => log::warn!("{} exited with {}", program, status),
                Err(e) => log::warn!("Lost track of {}: {}", program, e),
            }
        });
        Ok(())
    }
}
