//! PackageKit backend built on the `pkcon` console client.
//!
//! `pkcon --plain` prints one tab-separated line per package signal:
//! `<info label>\t<name>-<version>.<arch> (<origin>)\t<summary>`. The
//! composite `name;version;arch;origin` id is rebuilt from that printable
//! form; it is passed back verbatim on removal, which `pkcon` accepts.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio::process::Command;

use super::{Filter, PackageBackend, RemoveOptions, Transaction, TransactionSink};
use crate::error::ServiceError;
use crate::state::{PackageFound, PackageInfo};

/// Backend that spawns one `pkcon` process per transaction.
#[derive(Clone, Debug)]
pub struct PkconBackend {
    program: PathBuf,
}

impl PkconBackend {
    /// What: Locate `program` on `PATH`.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` when the program is not installed.
    pub fn locate(program: &str) -> Result<Self, ServiceError> {
        which::which(program)
            .map(|program| Self { program })
            .map_err(|_| ServiceError::NotFound {
                program: program.to_string(),
            })
    }

    /// Use an explicit program path without looking it up.
    #[must_use]
    pub fn with_program(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Path of the program this backend spawns.
    #[must_use]
    pub fn program(&self) -> &Path {
        &self.program
    }

    fn run(&self, args: Vec<String>) -> Transaction {
        let (sink, tx) = Transaction::channel();
        let program = self.program.clone();
        tokio::spawn(async move {
            tracing::debug!(program = %program.display(), args = ?args, "starting pkcon transaction");
            let result = drive(&program, &args, &sink).await;
            if let Err(e) = &result {
                tracing::debug!(error = %e, "pkcon transaction failed");
            }
            sink.finish(result);
        });
        tx
    }
}

/// Leading flags shared by every invocation.
fn base_args() -> Vec<String> {
    vec!["--plain".into(), "--noninteractive".into()]
}

impl PackageBackend for PkconBackend {
    fn get_packages(&self, filter: Filter) -> Transaction {
        let mut args = base_args();
        args.extend(["--filter".into(), filter.as_arg().into(), "get-packages".into()]);
        self.run(args)
    }

    fn search_names(&self, filter: Filter, terms: &[String]) -> Transaction {
        let mut args = base_args();
        if filter != Filter::None {
            args.extend(["--filter".into(), filter.as_arg().into()]);
        }
        args.extend(["search".into(), "name".into()]);
        args.extend(terms.iter().cloned());
        self.run(args)
    }

    fn remove_packages(&self, package_ids: &[String], options: RemoveOptions) -> Transaction {
        let mut args = base_args();
        if options.autoremove {
            args.push("--autoremove".into());
        }
        if !options.allow_deps {
            // pkcon always resolves reverse dependencies for removals
            tracing::debug!("pkcon has no switch to forbid dependent removals");
        }
        args.push("remove".into());
        args.extend(package_ids.iter().cloned());
        self.run(args)
    }

    fn install_packages(&self, names: &[String]) -> Transaction {
        let mut args = base_args();
        args.push("install".into());
        args.extend(names.iter().cloned());
        self.run(args)
    }
}

/// What: Run one `pkcon` process to completion, streaming package lines.
///
/// Inputs:
/// - `program`: `pkcon` path
/// - `args`: Full argument list
/// - `sink`: Producer half receiving parsed packages
///
/// Output:
/// - `Ok(())` on success; the reported failure message, exit status or
///   cancellation otherwise.
///
/// Details:
/// - Stderr is drained concurrently so a chatty process cannot block on a full pipe.
/// - The child is killed as soon as the consumer drops its handle.
async fn drive(program: &Path, args: &[String], sink: &TransactionSink) -> Result<(), ServiceError> {
    let program_name = program.display().to_string();
    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|source| ServiceError::Spawn {
            program: program_name.clone(),
            source,
        })?;

    let stderr_task = child.stderr.take().map(|mut stderr| {
        tokio::spawn(async move {
            let mut text = String::new();
            let _ = stderr.read_to_string(&mut text).await;
            text
        })
    });

    let mut failure: Option<String> = None;
    if let Some(stdout) = child.stdout.take() {
        let mut lines = BufReader::new(stdout).lines();
        loop {
            let line = tokio::select! {
                line = lines.next_line() => line?,
                () = sink.closed() => {
                    let _ = child.kill().await;
                    return Err(ServiceError::Cancelled);
                }
            };
            let Some(line) = line else { break };
            match parse_line(&line) {
                Some(PkconLine::Package(found)) => {
                    if !sink.package(found) {
                        let _ = child.kill().await;
                        return Err(ServiceError::Cancelled);
                    }
                }
                Some(PkconLine::Failure(message)) => {
                    failure.get_or_insert(message);
                }
                None => {}
            }
        }
    }

    if let Some(task) = stderr_task
        && let Ok(text) = task.await
    {
        for line in text.lines() {
            if let Some(PkconLine::Failure(message)) = parse_line(line) {
                failure.get_or_insert(message);
            }
        }
    }

    let status = child.wait().await?;
    if let Some(message) = failure {
        return Err(ServiceError::Failed { message });
    }
    if !status.success() {
        return Err(ServiceError::Exit {
            program: program_name,
            code: status.code(),
        });
    }
    Ok(())
}

/// Meaningful line kinds in `pkcon --plain` output.
#[derive(Debug, PartialEq, Eq)]
enum PkconLine {
    Package(PackageFound),
    Failure(String),
}

/// What: Classify one output line.
///
/// Output:
/// - `Package` for package signals, `Failure` for `Fatal error:`/`Command
///   failed:` lines, `None` for progress and status chatter.
fn parse_line(line: &str) -> Option<PkconLine> {
    let trimmed = line.trim();
    for prefix in ["Fatal error:", "Command failed:"] {
        if let Some(rest) = trimmed.strip_prefix(prefix) {
            return Some(PkconLine::Failure(rest.trim().to_string()));
        }
    }
    let mut fields = line.split('\t');
    let label = fields.next()?.trim();
    let printable = fields.next()?.trim();
    // Status chatter such as "Status:\tQuerying" or "Percentage:\t40"
    if label.is_empty() || label.ends_with(':') || printable.is_empty() {
        return None;
    }
    let summary = fields.collect::<Vec<_>>().join("\t");
    let package_id = package_id_from_printable(printable)?;
    Some(PkconLine::Package(PackageFound {
        info: PackageInfo::from_label(label),
        package_id,
        summary: summary.trim().to_string(),
    }))
}

/// What: Rebuild `name;version;arch;origin` from `name-version.arch (origin)`.
///
/// Output:
/// - `None` when no name/version boundary can be found.
///
/// Details:
/// - Splits from the right: the arch is the text after the last `.` unless
///   it starts with a digit, then version and release are the last two
///   `-` segments. Names may themselves contain `-<digit>`
///   (`xorg-x11-fonts-100dpi-7.5-36.fc38`).
/// - A segment without any digit cannot be a version, so a dashed name with a
///   release-less version (`foo-bar-1.0`) falls back to one segment.
fn package_id_from_printable(printable: &str) -> Option<String> {
    let (body, origin) = match printable.strip_suffix(')').and_then(|s| s.rsplit_once(" (")) {
        Some((body, origin)) => (body.trim(), origin.trim()),
        None => (printable.trim(), ""),
    };
    let (nevr, arch) = match body.rsplit_once('.') {
        Some((nevr, arch)) if !arch.is_empty() && !arch.starts_with(|c: char| c.is_ascii_digit()) => {
            (nevr, arch)
        }
        _ => (body, ""),
    };
    let has_digit = |seg: &str| seg.bytes().any(|b| b.is_ascii_digit());
    let segments: Vec<&str> = nevr.split('-').collect();
    let take = match segments.len() {
        0 | 1 => return None,
        2 => 1,
        n if has_digit(segments[n - 2]) => 2,
        _ => 1,
    };
    let (name, version) = segments.split_at(segments.len() - take);
    if version.iter().any(|seg| !has_digit(seg)) || name.iter().any(|seg| seg.is_empty()) {
        return None;
    }
    Some(format!("{};{};{arch};{origin}", name.join("-"), version.join("-")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    /// What: Ensure printable package strings rebuild composite ids.
    ///
    /// Inputs:
    /// - Names with dashes, epochs and origins; names containing `-<digit>`;
    ///   a printable without origin.
    ///
    /// Output:
    /// - `name;version;arch;origin` ids with the expected splits.
    fn printable_rebuilds_package_ids() {
        assert_eq!(
            package_id_from_printable("vim-enhanced-2:9.0.1-1.fc38.x86_64 (updates)").as_deref(),
            Some("vim-enhanced;2:9.0.1-1.fc38;x86_64;updates")
        );
        assert_eq!(
            package_id_from_printable("python3-3.11.4-1.noarch").as_deref(),
            Some("python3;3.11.4-1;noarch;")
        );
        assert_eq!(
            package_id_from_printable("bash-5.2 (installed)").as_deref(),
            Some("bash;5.2;;installed")
        );
        assert_eq!(
            package_id_from_printable("xorg-x11-fonts-100dpi-7.5-36.fc38.noarch (fedora)").as_deref(),
            Some("xorg-x11-fonts-100dpi;7.5-36.fc38;noarch;fedora")
        );
        assert_eq!(
            package_id_from_printable("texlive-12many-svn15878-64.fc38.noarch (fedora)").as_deref(),
            Some("texlive-12many;svn15878-64.fc38;noarch;fedora")
        );
        assert_eq!(
            package_id_from_printable("foo-bar-1.0.x86_64").as_deref(),
            Some("foo-bar;1.0;x86_64;")
        );
        assert_eq!(package_id_from_printable("no-version-here"), None);
        assert_eq!(package_id_from_printable("nodash.x86_64"), None);
    }

    #[test]
    /// What: Package signals become `PackageFound`; status lines are ignored.
    ///
    /// Inputs:
    /// - A padded `Installed` line, a `Status:` line and a `Results:` header.
    ///
    /// Output:
    /// - Only the package line parses.
    fn parse_line_keeps_package_signals_only() {
        let line = "Installed   \tvim-9.0-1.x86_64 (installed:fedora)\tVi IMproved";
        let Some(PkconLine::Package(found)) = parse_line(line) else {
            panic!("expected a package line");
        };
        assert_eq!(found.info, PackageInfo::Installed);
        assert_eq!(found.package_id, "vim;9.0-1;x86_64;installed:fedora");
        assert_eq!(found.summary, "Vi IMproved");

        assert_eq!(parse_line("Status:\tQuerying"), None);
        assert_eq!(parse_line("Results:"), None);
        assert_eq!(parse_line(""), None);
    }

    #[test]
    /// What: Failure lines carry the service message without the prefix.
    fn parse_line_extracts_failure_messages() {
        assert_eq!(
            parse_line("Fatal error: locked"),
            Some(PkconLine::Failure("locked".into()))
        );
        assert_eq!(
            parse_line("Command failed: Not authorized"),
            Some(PkconLine::Failure("Not authorized".into()))
        );
    }

    #[tokio::test]
    /// What: A missing program surfaces as a spawn failure through the transaction.
    async fn missing_program_fails_transaction() {
        let backend = PkconBackend::with_program("/nonexistent/pkcon-for-tests");
        let err = backend
            .get_packages(Filter::Installed)
            .collect()
            .await
            .expect_err("spawn fails");
        assert!(matches!(err, ServiceError::Spawn { .. }));
    }
}
