//! The leaf operation interface.
//!
//! Every pixel operation - sources, composites, filters, sinks - implements
//! [`PixelOp`]. The trait is deliberately small: declare how much input is
//! needed for a given output region, then render one tile. Port topology is
//! static per operation type and lives in the registry
//! ([`OpSpec`](crate::OpSpec)), not on instances.

use pixelgraph_core::{Rect, Tile};
use thiserror::Error;

/// Conventional primary input port name.
pub const PORT_INPUT: &str = "input";
/// Conventional secondary input port name (masks, backdrops).
pub const PORT_AUX: &str = "aux";
/// The single output port every node exposes.
pub const PORT_OUTPUT: &str = "output";

/// Static description of one input port.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortDef {
    /// Port name, unique within the operation.
    pub name: &'static str,
    /// Whether evaluation must fail if nothing is connected here.
    pub required: bool,
}

impl PortDef {
    /// A port that must be connected.
    pub const fn required(name: &'static str) -> Self {
        Self {
            name,
            required: true,
        }
    }

    /// A port that may be left unconnected.
    pub const fn optional(name: &'static str) -> Self {
        Self {
            name,
            required: false,
        }
    }
}

/// Errors raised by operation construction or rendering.
#[derive(Debug, Error)]
pub enum OpError {
    /// A parameter is missing, has the wrong type, or an unusable value.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// The operation cannot service this request.
    #[error("unsupported operation: {0}")]
    Unsupported(String),

    /// A buffer access failed underneath the operation.
    #[error(transparent)]
    Core(#[from] pixelgraph_core::Error),
}

/// Input tiles handed to [`PixelOp::render`], keyed by port name.
///
/// An optional port with nothing connected is simply absent.
pub struct RenderInputs<'a> {
    entries: Vec<(&'a str, &'a Tile)>,
}

impl<'a> RenderInputs<'a> {
    /// Creates the input set from (port, tile) pairs.
    pub fn new(entries: Vec<(&'a str, &'a Tile)>) -> Self {
        Self { entries }
    }

    /// An empty input set, for source operations.
    pub fn empty() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// The tile connected to `port`, if any.
    pub fn get(&self, port: &str) -> Option<&'a Tile> {
        self.entries
            .iter()
            .find(|(name, _)| *name == port)
            .map(|(_, tile)| *tile)
    }
}

/// One parameterized pixel operation, ready to render tiles.
///
/// Instances are built by the registry from a node's
/// [`ParamMap`](crate::ParamMap) during executor preflight, so parameter
/// problems fail the call before any tile is processed.
///
/// Implementations must be deterministic: the same inputs and output region
/// must produce bit-identical pixels, regardless of how the evaluation
/// region was partitioned into tiles. Stochastic effects hash pixel
/// coordinates instead of drawing from mutable RNG state.
pub trait PixelOp: Send {
    /// The input region required on `port` to produce the output region.
    ///
    /// Defaults to the output region itself, which is correct for all
    /// point operations. Area operations (blur) grow it; geometric
    /// operations (scale, transform) map it.
    fn required_rect(&self, port: &str, out: Rect) -> Rect {
        let _ = port;
        out
    }

    /// Renders the output tile from the given inputs.
    fn render(&self, inputs: &RenderInputs<'_>, out: &mut Tile) -> Result<(), OpError>;
}
