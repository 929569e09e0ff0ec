//! Command dispatch surface
//!
//! A `(action, string-argument)` request is first checked with a pure
//! `get_status` query (safe to call speculatively, e.g. to grey out a
//! menu entry) and then executed with `do_dispatch`, which declines when
//! the status would have been disabled.

use crate::error::{MathedError, MathedResult};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Actions the math engine understands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Action {
    /// Structural table edit; the argument names the feature and an
    /// optional repeat count, e.g. "append-row 2"
    TabularFeature,
    /// Paste parsed clipboard content at the cursor
    Paste,
    /// Cursor motions, consumed by the surrounding editor shell
    CharForward,
    CharBackward,
    Up,
    Down,
}

/// A dispatched command: an action plus its string argument
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FuncRequest {
    pub action: Action,
    pub argument: String,
}

impl FuncRequest {
    pub fn new(action: Action, argument: impl Into<String>) -> Self {
        Self {
            action,
            argument: argument.into(),
        }
    }

    /// Shorthand for a table-editing request
    pub fn tabular(argument: impl Into<String>) -> Self {
        Self::new(Action::TabularFeature, argument)
    }
}

/// Answer of the pure status query: enabled, or disabled with a reason
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FuncStatus {
    enabled: bool,
    message: Option<String>,
}

impl FuncStatus {
    pub fn enabled() -> Self {
        Self {
            enabled: true,
            message: None,
        }
    }

    pub fn disabled(message: impl Into<String>) -> Self {
        Self {
            enabled: false,
            message: Some(message.into()),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }
}

/// Whether a mutating dispatch actually ran
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchResult {
    Dispatched,
    Undispatched,
}

impl DispatchResult {
    pub fn dispatched(self) -> bool {
        self == DispatchResult::Dispatched
    }
}

/// The structural grid edits reachable through `TabularFeature`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GridFeature {
    AppendRow,
    DeleteRow,
    CopyRow,
    SwapRow,
    AppendColumn,
    DeleteColumn,
    CopyColumn,
    SwapColumn,
    AddHlineAbove,
    AddHlineBelow,
    DeleteHlineAbove,
    DeleteHlineBelow,
    AddVlineLeft,
    AddVlineRight,
    DeleteVlineLeft,
    DeleteVlineRight,
    AlignLeft,
    AlignCenter,
    AlignRight,
    ValignTop,
    ValignMiddle,
    ValignBottom,
    Multicolumn,
    SplitCell,
}

impl GridFeature {
    pub fn name(self) -> &'static str {
        match self {
            GridFeature::AppendRow => "append-row",
            GridFeature::DeleteRow => "delete-row",
            GridFeature::CopyRow => "copy-row",
            GridFeature::SwapRow => "swap-row",
            GridFeature::AppendColumn => "append-column",
            GridFeature::DeleteColumn => "delete-column",
            GridFeature::CopyColumn => "copy-column",
            GridFeature::SwapColumn => "swap-column",
            GridFeature::AddHlineAbove => "add-hline-above",
            GridFeature::AddHlineBelow => "add-hline-below",
            GridFeature::DeleteHlineAbove => "delete-hline-above",
            GridFeature::DeleteHlineBelow => "delete-hline-below",
            GridFeature::AddVlineLeft => "add-vline-left",
            GridFeature::AddVlineRight => "add-vline-right",
            GridFeature::DeleteVlineLeft => "delete-vline-left",
            GridFeature::DeleteVlineRight => "delete-vline-right",
            GridFeature::AlignLeft => "align-left",
            GridFeature::AlignCenter => "align-center",
            GridFeature::AlignRight => "align-right",
            GridFeature::ValignTop => "valign-top",
            GridFeature::ValignMiddle => "valign-middle",
            GridFeature::ValignBottom => "valign-bottom",
            GridFeature::Multicolumn => "multicolumn",
            GridFeature::SplitCell => "split-cell",
        }
    }
}

impl FromStr for GridFeature {
    type Err = MathedError;

    fn from_str(s: &str) -> MathedResult<Self> {
        let feature = match s {
            "append-row" => GridFeature::AppendRow,
            "delete-row" => GridFeature::DeleteRow,
            "copy-row" => GridFeature::CopyRow,
            "swap-row" => GridFeature::SwapRow,
            "append-column" => GridFeature::AppendColumn,
            "delete-column" => GridFeature::DeleteColumn,
            "copy-column" => GridFeature::CopyColumn,
            "swap-column" => GridFeature::SwapColumn,
            "add-hline-above" => GridFeature::AddHlineAbove,
            "add-hline-below" => GridFeature::AddHlineBelow,
            "delete-hline-above" => GridFeature::DeleteHlineAbove,
            "delete-hline-below" => GridFeature::DeleteHlineBelow,
            "add-vline-left" => GridFeature::AddVlineLeft,
            "add-vline-right" => GridFeature::AddVlineRight,
            "delete-vline-left" => GridFeature::DeleteVlineLeft,
            "delete-vline-right" => GridFeature::DeleteVlineRight,
            "align-left" => GridFeature::AlignLeft,
            "align-center" => GridFeature::AlignCenter,
            "align-right" => GridFeature::AlignRight,
            "valign-top" => GridFeature::ValignTop,
            "valign-middle" => GridFeature::ValignMiddle,
            "valign-bottom" => GridFeature::ValignBottom,
            "multicolumn" => GridFeature::Multicolumn,
            "split-cell" => GridFeature::SplitCell,
            other => return Err(MathedError::InvalidArgument(other.to_string())),
        };
        Ok(feature)
    }
}

/// Parse a tabular-feature argument: the feature name followed by an
/// optional repeat count (defaulting to 1)
pub fn parse_grid_feature(argument: &str) -> MathedResult<(GridFeature, usize)> {
    let mut parts = argument.split_whitespace();
    let name = parts
        .next()
        .ok_or_else(|| MathedError::InvalidArgument(argument.to_string()))?;
    let feature = name.parse::<GridFeature>()?;
    let count = match parts.next() {
        Some(n) => n
            .parse::<usize>()
            .map_err(|_| MathedError::InvalidArgument(argument.to_string()))?
            .max(1),
        None => 1,
    };
    Ok((feature, count))
}
