//! Display surface: the per-frame view model and a plain-text renderer.

use std::io::Write;

use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use super::Action;
use crate::logic::Mode;

/// Text of the notice replacing the surface without administrative access.
pub const ADMIN_REQUIRED: &str = "administrative access required";

/// Widest name column before truncation.
const NAME_COLUMN_MAX: usize = 32;

/// Action offered on a listed row.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RowAction {
    /// Not installed; offer install.
    Install,
    /// Already installed; install again.
    Reinstall,
    /// Installed-set row; offer removal.
    Uninstall,
}

impl RowAction {
    /// Button label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Install => "Install",
            Self::Reinstall => "Reinstall",
            Self::Uninstall => "Uninstall",
        }
    }
}

/// One listed package.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Row {
    /// Package id.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Version.
    pub version: String,
    /// First summary line.
    pub summary: String,
    /// Offered action.
    pub action: RowAction,
}

impl Row {
    /// What: Action dispatched when the row's button is used.
    ///
    /// Output:
    /// - `Install(name)` for install rows, `RequestRemove(id)` for uninstall rows.
    #[must_use]
    pub fn dispatch_action(&self) -> Action {
        match self.action {
            RowAction::Install | RowAction::Reinstall => Action::Install(self.name.clone()),
            RowAction::Uninstall => Action::RequestRemove(self.id.clone()),
        }
    }
}

/// Open remove confirmation as shown to the user.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConfirmView {
    /// Id awaiting confirmation.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Transaction running.
    pub removing: bool,
    /// Inline failure message.
    pub error: Option<String>,
}

/// Everything the display surface needs for one frame.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PanelView {
    /// Static notice replacing the whole surface.
    AdminRequired,
    /// Normal package view.
    Packages {
        /// Active mode.
        mode: Mode,
        /// Search box text.
        query: String,
        /// Rows in display order.
        rows: Vec<Row>,
        /// Loading or searching.
        loading: bool,
        /// Non-modal error line.
        error: Option<String>,
        /// Open remove confirmation.
        confirm: Option<ConfirmView>,
        /// Package whose install is running.
        installing: Option<String>,
    },
}

/// Collaborator that shows panel frames.
pub trait DisplaySurface {
    /// Show `view`, replacing the previous frame.
    ///
    /// # Errors
    ///
    /// Returns the I/O error of the underlying output.
    fn render(&mut self, view: &PanelView) -> std::io::Result<()>;
}

/// Truncate `s` to `max` display columns, marking the cut with `…`.
fn fit(s: &str, max: usize) -> String {
    if s.width() <= max {
        return s.to_string();
    }
    let mut out = String::new();
    let mut used = 0usize;
    for ch in s.chars() {
        let w = ch.width().unwrap_or(0);
        if used + w + 1 > max {
            break;
        }
        out.push(ch);
        used += w;
    }
    out.push('…');
    out
}

/// Pad `s` with spaces to `width` display columns.
fn pad(s: &str, width: usize) -> String {
    let mut out = s.to_string();
    out.extend(std::iter::repeat_n(' ', width.saturating_sub(s.width())));
    out
}

/// Plain-text surface writing one frame per render.
#[derive(Debug)]
pub struct TextSurface<W: Write> {
    out: W,
}

impl<W: Write> TextSurface<W> {
    /// Surface writing to `out`.
    pub const fn new(out: W) -> Self {
        Self { out }
    }

    /// Consume the surface and return the writer.
    pub fn into_inner(self) -> W {
        self.out
    }

    fn render_packages(
        &mut self,
        mode: Mode,
        query: &str,
        rows: &[Row],
        loading: bool,
    ) -> std::io::Result<()> {
        let status = if loading { "  (loading…)" } else { "" };
        writeln!(self.out, "[{}] search: {query:?}{status}", mode.label())?;
        if rows.is_empty() && !loading {
            writeln!(self.out, "  no packages")?;
        }
        let names: Vec<String> = rows.iter().map(|r| fit(&r.name, NAME_COLUMN_MAX)).collect();
        let name_w = names.iter().map(|n| n.width()).max().unwrap_or(0);
        let ver_w = rows.iter().map(|r| r.version.width()).max().unwrap_or(0);
        for (row, name) in rows.iter().zip(&names) {
            writeln!(
                self.out,
                "  {}  {}  [{}]  {}",
                pad(name, name_w),
                pad(&row.version, ver_w),
                row.action.label(),
                row.summary
            )?;
        }
        Ok(())
    }
}

impl<W: Write> DisplaySurface for TextSurface<W> {
    fn render(&mut self, view: &PanelView) -> std::io::Result<()> {
        match view {
            PanelView::AdminRequired => writeln!(self.out, "{ADMIN_REQUIRED}")?,
            PanelView::Packages {
                mode,
                query,
                rows,
                loading,
                error,
                confirm,
                installing,
            } => {
                self.render_packages(*mode, query, rows, *loading)?;
                if let Some(name) = installing {
                    writeln!(self.out, "installing {name}…")?;
                }
                if let Some(e) = error {
                    writeln!(self.out, "error: {e}")?;
                }
                if let Some(c) = confirm {
                    if c.removing {
                        writeln!(self.out, "removing {}…", c.name)?;
                    } else {
                        writeln!(self.out, "remove {} ({})? /yes or /no", c.name, c.id)?;
                    }
                    if let Some(e) = &c.error {
                        writeln!(self.out, "  ! {e}")?;
                    }
                }
            }
        }
        self.out.flush()
    }
}
