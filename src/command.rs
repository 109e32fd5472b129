//! Running external command line tools.
//!
//! The tools are treated as black boxes. Their exit status is not trusted to mean much: a non-zero
//! status is logged together with the tool's error output, and the caller notices real failures when
//! the expected output file is missing.

use log::{debug, warn};

use std::ffi::{OsStr, OsString};
use std::fmt;
use std::fs::File;
use std::path::Path;
use std::process::{Command, Output, Stdio};

use crate::error::Result;


/// A command line for an external program, built up one argument at a time.
#[derive(Debug, Clone, PartialEq)]
pub struct ExternalCommand {
    program: OsString,
    args: Vec<OsString>,
}

impl ExternalCommand {

    pub fn new<S: AsRef<OsStr>>(program: S) -> ExternalCommand {
        ExternalCommand {
            program: program.as_ref().to_os_string(),
            args: Vec::new(),
        }
    }

    pub fn arg<S: AsRef<OsStr>>(&mut self, arg: S) -> &mut ExternalCommand {
        self.args.push(arg.as_ref().to_os_string());
        self
    }

    pub fn args<I, S>(&mut self, args: I) -> &mut ExternalCommand
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        for arg in args {
            self.arg(arg);
        }
        self
    }

    pub fn program(&self) -> &OsStr {
        &self.program
    }

    pub fn get_args(&self) -> &[OsString] {
        &self.args
    }

    fn to_command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        cmd
    }

    /// Run the command and wait for it. Standard output is discarded.
    ///
    /// # Errors
    ///
    /// If the program cannot be started, e.g. because it is not installed.
    pub fn run(&self) -> Result<()> {
        debug!("Running: {}", self);
        let output = self.to_command()
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()?;
        self.report_status(&output);
        Ok(())
    }

    /// Run the command and write its standard output to `stdout_file`, which is created or truncated.
    pub fn run_to_file<P: AsRef<Path>>(&self, stdout_file: P) -> Result<()> {
        debug!("Running: {} > {}", self, stdout_file.as_ref().display());
        let file = File::create(stdout_file)?;
        let output = self.to_command()
            .stdin(Stdio::null())
            .stdout(Stdio::from(file))
            .stderr(Stdio::piped())
            .output()?;
        self.report_status(&output);
        Ok(())
    }

    /// Run the command and return its standard output as text.
    pub fn run_capture(&self) -> Result<String> {
        debug!("Running: {}", self);
        let output = self.to_command()
            .stdin(Stdio::null())
            .stderr(Stdio::piped())
            .output()?;
        self.report_status(&output);
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    fn report_status(&self, output: &Output) {
        if !output.status.success() {
            warn!(
                "'{}' exited with {}: {}",
                self.program.to_string_lossy(),
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }
    }
}

impl fmt::Display for ExternalCommand {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.program.to_string_lossy())?;
        for arg in &self.args {
            write!(f, " {}", arg.to_string_lossy())?;
        }
        Ok(())
    }
}
