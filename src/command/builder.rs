//! Builder for the worker argument vector.

/// Assembles the argument vector for one worker invocation.
///
/// Arguments prefixed with `-J` are per-process flags in the style of
/// `javac -J`: the prefix is stripped and the remainder is hoisted to the
/// launcher position, ahead of the tool arguments. The supervisor itself
/// treats the finished vector opaquely.
#[derive(Debug, Clone, Default)]
pub struct InvocationBuilder {
    launcher: String,
    launcher_args: Vec<String>,
    tool_args: Vec<String>,
    porcelain: bool,
}

impl InvocationBuilder {
    /// Starts a new invocation of the given launcher program (for a JVM
    /// worker, the `java` executable).
    #[must_use]
    pub fn new(launcher: impl Into<String>) -> Self {
        Self {
            launcher: launcher.into(),
            ..Default::default()
        }
    }

    /// Adds one argument. `-J`-prefixed arguments are routed to the launcher.
    #[must_use]
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        let arg = arg.into();
        if let Some(process_flag) = arg.strip_prefix("-J") {
            self.launcher_args.push(process_flag.to_string());
        } else {
            self.tool_args.push(arg);
        }
        self
    }

    /// Adds several arguments, each routed as by [`arg`](Self::arg).
    #[must_use]
    pub fn args<I, A>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = A>,
        A: Into<String>,
    {
        for arg in args {
            self = self.arg(arg);
        }
        self
    }

    /// Appends the flag that switches the worker into machine-readable
    /// transmission mode.
    #[must_use]
    pub fn porcelain(mut self, porcelain: bool) -> Self {
        self.porcelain = porcelain;
        self
    }

    /// Produces the final argument vector: launcher, hoisted per-process
    /// flags, tool arguments, and the porcelain flag last.
    #[must_use]
    pub fn build(&self) -> Vec<String> {
        let mut argv = Vec::with_capacity(2 + self.launcher_args.len() + self.tool_args.len());
        argv.push(self.launcher.clone());
        argv.extend(self.launcher_args.iter().cloned());
        argv.extend(self.tool_args.iter().cloned());
        if self.porcelain {
            argv.push("--porcelain".to_string());
        }
        argv
    }
}
