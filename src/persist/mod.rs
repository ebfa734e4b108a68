//! Versioned binary persistence for trees.
//!
//! Trees serialise to a self-describing [`postcard`] payload behind a
//! version-tagged envelope, the model descriptor included, so a dump can be
//! reloaded without external context. See [`schema`] for the format types.

mod convert;
mod error;
pub mod schema;

pub use error::PersistError;

use std::io;

use crate::config::TreeConfig;
use crate::data::Model;
use crate::tree::{HoeffdingTree, Node, NodeId};

use schema::{Payload, PayloadV1};

/// Serialise a tree (model plus nodes) to a writer.
pub(crate) fn dump(
    model: &Model,
    nodes: &[Node],
    root: NodeId,
    mut writer: impl io::Write,
) -> Result<(), PersistError> {
    let payload = Payload::V1(PayloadV1 {
        model: convert::model_to_schema(model),
        root: convert::node_to_schema(nodes, root),
    });
    let bytes = postcard::to_allocvec(&payload)?;
    writer.write_all(&bytes)?;
    Ok(())
}

/// Reconstruct a tree from a readable source.
pub(crate) fn load(
    mut reader: impl io::Read,
    config: TreeConfig,
) -> Result<HoeffdingTree, PersistError> {
    let mut bytes = Vec::new();
    reader.read_to_end(&mut bytes)?;

    let Payload::V1(payload) = postcard::from_bytes(&bytes)?;
    let model = convert::model_from_schema(payload.model)?;
    let resolved = config.normalize(model.is_regression())?;

    let mut nodes = Vec::new();
    let root = convert::node_from_schema(payload.root, &model, &mut nodes)?;
    Ok(HoeffdingTree::from_parts(model, nodes, root, resolved))
}
