//! The PC-build configurator: compatibility rules over a chosen part
//! list, and shareable build codes.
//!
//! The rules are deliberately coarse, they catch the mistakes a
//! first-time builder actually makes (wrong socket, wrong memory
//! generation, undersized PSU, board that doesn't fit the case).
//! Anything the catalog data doesn't describe is assumed compatible.

use std::collections::BTreeMap;
use std::error::Error as StdError;
use std::fmt::{self, Display};

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::{Deserialize, Serialize};

/// The slot a component occupies in a build.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize,
    Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum ComponentKind {
    /// The processor.
    Cpu,
    /// The motherboard.
    Motherboard,
    /// A memory kit.
    Memory,
    /// The graphics card.
    Gpu,
    /// An SSD or hard drive.
    Storage,
    /// The power supply.
    Psu,
    /// The case.
    Case,
}

/// Board sizes, smallest first so the derived ordering can express
/// "fits inside".
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize,
    Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum FormFactor {
    /// Mini-ITX.
    MiniItx,
    /// Micro-ATX.
    MicroAtx,
    /// ATX.
    Atx,
}

impl Display for FormFactor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormFactor::MiniItx => write!(f, "Mini-ITX"),
            FormFactor::MicroAtx => write!(f, "Micro-ATX"),
            FormFactor::Atx => write!(f, "ATX"),
        }
    }
}

/// A catalog part with the attributes the compatibility rules need.
///
/// Attributes that don't apply to a part's kind are simply left unset.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Component {
    /// The catalog product id.
    pub id: String,
    /// Display name.
    pub name: String,
    /// The slot this part occupies.
    pub kind: ComponentKind,
    /// CPU/motherboard socket, e.g. "AM5".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub socket: Option<String>,
    /// Memory generation, e.g. "DDR5", on memory kits and boards.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memory_type: Option<String>,
    /// Estimated power draw in watts.
    #[serde(default)]
    pub wattage_draw: u32,
    /// For PSUs, the rated output in watts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub psu_wattage: Option<u32>,
    /// Board size for motherboards; largest supported size for cases.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub form_factor: Option<FormFactor>,
}

/// A violated compatibility rule.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum CompatIssue {
    /// The CPU does not fit the motherboard socket.
    SocketMismatch {
        /// The CPU's socket.
        cpu_socket: String,
        /// The motherboard's socket.
        board_socket: String,
    },
    /// The memory generation is not supported by the motherboard.
    MemoryTypeMismatch {
        /// The memory kit's generation.
        module_type: String,
        /// The generation the board supports.
        board_type: String,
    },
    /// The PSU cannot cover the estimated draw plus headroom.
    InsufficientPsu {
        /// Estimated draw including headroom, in watts.
        required_watts: u32,
        /// The PSU's rated output, in watts.
        rated_watts: u32,
    },
    /// The case cannot hold the selected motherboard.
    CaseTooSmall {
        /// The board's form factor.
        board: FormFactor,
        /// The largest form factor the case supports.
        case: FormFactor,
    },
}

impl Display for CompatIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompatIssue::SocketMismatch {
                cpu_socket,
                board_socket,
            } => write!(
                f,
                "CPU socket {cpu_socket} does not fit the board's \
                 {board_socket} socket"
            ),
            CompatIssue::MemoryTypeMismatch {
                module_type,
                board_type,
            } => write!(
                f,
                "{module_type} memory is not supported by this \
                 {board_type} board"
            ),
            CompatIssue::InsufficientPsu {
                required_watts,
                rated_watts,
            } => write!(
                f,
                "the {rated_watts} W power supply is below the estimated \
                 {required_watts} W this build needs"
            ),
            CompatIssue::CaseTooSmall { board, case } => write!(
                f,
                "a {board} board does not fit a case that takes up to \
                 {case}"
            ),
        }
    }
}

/// Error type for share-code decoding.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ShareCodeError {
    /// The code is not valid base64.
    InvalidEncoding,
    /// The decoded bytes are not a valid build payload.
    InvalidPayload,
}

impl Display for ShareCodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShareCodeError::InvalidEncoding => {
                write!(f, "share code is not valid base64")
            }
            ShareCodeError::InvalidPayload => {
                write!(f, "share code payload is malformed")
            }
        }
    }
}

impl StdError for ShareCodeError {}

/// The in-progress build: at most one selected component per slot.
#[derive(Clone, Debug, Default)]
pub struct BuildConfigurator {
    selected: BTreeMap<ComponentKind, Component>,
}

impl BuildConfigurator {
    /// Creates an empty build.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Selects a component, replacing any previous choice for its
    /// slot.
    pub fn select(&mut self, component: Component) {
        self.selected.insert(component.kind, component);
    }

    /// Clears a slot.
    pub fn deselect(&mut self, kind: ComponentKind) {
        self.selected.remove(&kind);
    }

    /// Returns the component selected for a slot.
    #[inline]
    pub fn selected(&self, kind: ComponentKind) -> Option<&Component> {
        self.selected.get(&kind)
    }

    /// Estimated draw of all parts except the PSU, with 20% headroom.
    pub fn required_watts(&self) -> u32 {
        let draw: u32 = self
            .selected
            .values()
            .filter(|c| c.kind != ComponentKind::Psu)
            .map(|c| c.wattage_draw)
            .sum();
        draw + draw / 5
    }

    /// Checks every rule the chosen parts allow.
    ///
    /// Slots that are still empty, and attributes the catalog doesn't
    /// describe, produce no issues.
    pub fn check(&self) -> Vec<CompatIssue> {
        let mut issues = Vec::new();

        let board = self.selected(ComponentKind::Motherboard);

        if let (Some(cpu), Some(board)) =
            (self.selected(ComponentKind::Cpu), board)
        {
            if let (Some(cpu_socket), Some(board_socket)) =
                (&cpu.socket, &board.socket)
            {
                if cpu_socket != board_socket {
                    issues.push(CompatIssue::SocketMismatch {
                        cpu_socket: cpu_socket.clone(),
                        board_socket: board_socket.clone(),
                    });
                }
            }
        }

        if let (Some(memory), Some(board)) =
            (self.selected(ComponentKind::Memory), board)
        {
            if let (Some(module_type), Some(board_type)) =
                (&memory.memory_type, &board.memory_type)
            {
                if module_type != board_type {
                    issues.push(CompatIssue::MemoryTypeMismatch {
                        module_type: module_type.clone(),
                        board_type: board_type.clone(),
                    });
                }
            }
        }

        if let Some(psu) = self.selected(ComponentKind::Psu) {
            if let Some(rated_watts) = psu.psu_wattage {
                let required_watts = self.required_watts();
                if rated_watts < required_watts {
                    issues.push(CompatIssue::InsufficientPsu {
                        required_watts,
                        rated_watts,
                    });
                }
            }
        }

        if let (Some(case), Some(board)) =
            (self.selected(ComponentKind::Case), board)
        {
            if let (Some(case_max), Some(board_ff)) =
                (case.form_factor, board.form_factor)
            {
                if board_ff > case_max {
                    issues.push(CompatIssue::CaseTooSmall {
                        board: board_ff,
                        case: case_max,
                    });
                }
            }
        }

        issues
    }

    /// Encodes the selected part ids into a shareable code.
    ///
    /// The code carries ids only; decoding resolves them against the
    /// live catalog, so prices and availability are never baked in.
    pub fn share_code(&self) -> String {
        let ids: BTreeMap<ComponentKind, &str> = self
            .selected
            .iter()
            .map(|(kind, component)| (*kind, component.id.as_str()))
            .collect();
        let payload = serde_json::to_vec(&ids)
            .expect("a map of part ids is always serializable");
        URL_SAFE_NO_PAD.encode(payload)
    }

    /// Decodes a share code back into part ids per slot.
    pub fn decode_share_code(
        code: &str,
    ) -> Result<BTreeMap<ComponentKind, String>, ShareCodeError> {
        let payload = URL_SAFE_NO_PAD
            .decode(code)
            .map_err(|_| ShareCodeError::InvalidEncoding)?;
        serde_json::from_slice(&payload)
            .map_err(|_| ShareCodeError::InvalidPayload)
    }
}
