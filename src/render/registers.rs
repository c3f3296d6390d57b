use std::collections::HashMap;
use std::sync::Arc;

use futures::future::BoxFuture;

use crate::render::{Context, Emitter};
use crate::value::BlockDrop;
use crate::Result;

/// Renders a block, given the drop its body sees as `block`.
pub type BlockRender = Arc<
    dyn for<'a> Fn(&'a mut Context, BlockDrop, &'a mut dyn Emitter) -> BoxFuture<'a, Result<()>>
        + Send
        + Sync,
>;

/// Builds a [`BlockRender`] from a closure.
pub(crate) fn block_render<F>(f: F) -> BlockRender
where
    F: for<'a> Fn(&'a mut Context, BlockDrop, &'a mut dyn Emitter) -> BoxFuture<'a, Result<()>>
        + Send
        + Sync
        + 'static,
{
    Arc::new(f)
}

/// Whether `block` tags emit their content or record it for a layout.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BlockMode {
    #[default]
    Output,
    Store,
}

/// State shared between occurrences of a tag during one render.
#[derive(Clone, Default)]
pub struct Registers {
    /// Where `for ... offset: continue` resumes, by loop identity.
    pub(crate) for_continue: HashMap<String, usize>,
    /// The next candidate index of each `cycle` group.
    pub(crate) cycle: HashMap<String, usize>,
    pub(crate) blocks: HashMap<String, BlockRender>,
    pub(crate) block_mode: BlockMode,
}

/// The block registers saved around an `include`.
pub(crate) struct SavedBlocks {
    blocks: HashMap<String, BlockRender>,
    block_mode: BlockMode,
}

impl Registers {
    /// Clears the block registers returning the previous values.
    pub(crate) fn save_blocks(&mut self) -> SavedBlocks {
        SavedBlocks {
            blocks: std::mem::take(&mut self.blocks),
            block_mode: std::mem::replace(&mut self.block_mode, BlockMode::Output),
        }
    }

    pub(crate) fn restore_blocks(&mut self, saved: SavedBlocks) {
        self.blocks = saved.blocks;
        self.block_mode = saved.block_mode;
    }
}

impl std::fmt::Debug for Registers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registers")
            .field("for_continue", &self.for_continue)
            .field("cycle", &self.cycle)
            .field("blocks", &self.blocks.keys().collect::<Vec<_>>())
            .field("block_mode", &self.block_mode)
            .finish()
    }
}
