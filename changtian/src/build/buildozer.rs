//! Buildozer command builder.
//!
//! [`BuildozerBuilder`] assembles `buildozer [-v] <target> <command>` on top
//! of [`AppContext::buildozer`], which already carries the SDK environment.

use std::process::ExitStatus;

use crate::{ctx::AppContext, utils::Command};

/// Fluent builder for one Buildozer invocation.
pub struct BuildozerBuilder<'a> {
    ctx: &'a AppContext,
    target: &'static str,
    command: &'static str,
    verbose: bool,
}

impl<'a> BuildozerBuilder<'a> {
    fn new(ctx: &'a AppContext, command: &'static str) -> Self {
        Self {
            ctx,
            target: "android",
            command,
            verbose: false,
        }
    }

    /// `buildozer android debug`
    pub fn debug(ctx: &'a AppContext) -> Self {
        Self::new(ctx, "debug")
    }

    /// `buildozer android clean`
    pub fn clean(ctx: &'a AppContext) -> Self {
        Self::new(ctx, "clean")
    }

    /// Passes `-v` to Buildozer.
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Builds the underlying command without running it.
    pub fn command(&self) -> Command {
        let mut cmd = self.ctx.buildozer();
        if self.verbose {
            cmd.arg("-v");
        }
        cmd.arg(self.target);
        cmd.arg(self.command);
        cmd
    }

    /// Runs Buildozer with inherited output and returns its exit status.
    ///
    /// # Errors
    ///
    /// Returns an error if Buildozer cannot be started or times out.
    pub async fn status(self) -> anyhow::Result<ExitStatus> {
        self.command().status().await
    }
}
