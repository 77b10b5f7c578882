//! Solver configuration.

crate::prelude!();

use std::{path::PathBuf, time::Duration};

use rsmt2::SmtConf;

#[cfg(test)]
mod test;

/// Configuration of the SMT solver used by [`oracle::SmtOracle`].
///
/// ```rust
/// # use hintsys::conf::Conf;
/// # use std::time::Duration;
/// let conf = Conf::default().with_cmd("z3 -v:0").with_timeout(Duration::from_secs(5));
/// assert_eq!(conf.cmd(), "z3 -v:0");
/// assert_eq!(conf.timeout(), Duration::from_secs(5));
/// assert!(conf.tee().is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conf {
    cmd: String,
    timeout: Duration,
    tee: Option<PathBuf>,
}
impl Default for Conf {
    fn default() -> Self {
        Self {
            cmd: "z3".into(),
            timeout: Duration::from_secs(20),
            tee: None,
        }
    }
}
impl Conf {
    /// Sets the z3 command, possibly followed by whitespace-separated options.
    pub fn with_cmd(mut self, cmd: impl Into<String>) -> Self {
        self.cmd = cmd.into();
        self
    }
    /// Sets the timeout of each solver query.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
    /// Sets a file to log solver queries to.
    ///
    /// Each query overwrites the file.
    pub fn with_tee(mut self, tee: impl Into<PathBuf>) -> Self {
        self.tee = Some(tee.into());
        self
    }

    /// Solver command.
    pub fn cmd(&self) -> &str {
        &self.cmd
    }
    /// Timeout of each solver query.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }
    /// File solver queries are logged to, if any.
    pub fn tee(&self) -> Option<&PathBuf> {
        self.tee.as_ref()
    }

    /// `rsmt2` configuration for the solver command and timeout.
    pub fn to_smt_conf(&self) -> Res<SmtConf> {
        let mut split_cmd = self.cmd.split(char::is_whitespace);
        let z3_cmd = split_cmd
            .next()
            .map(str::trim)
            .filter(|cmd| !cmd.is_empty())
            .ok_or_else(|| format!("illegal z3 command `{}`", self.cmd))?;
        let mut conf = SmtConf::z3(z3_cmd);
        for opt in split_cmd.map(str::trim).filter(|opt| !opt.is_empty()) {
            conf.option(opt);
        }
        conf.option(format!("-t:{}", self.timeout.as_millis()));
        Ok(conf)
    }
}
