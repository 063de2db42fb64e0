use swc_core::common::comments::{
    Comment, CommentKind, Comments as CommentsTrait, SingleThreadedComments,
};
use swc_core::common::{BytePos, DUMMY_SP};
use tracing::warn;

pub const PURE_ANNOTATION: &str = "@__PURE__";

#[derive(Clone, Default)]
pub struct Comments(SingleThreadedComments);

impl Comments {
    pub fn get_swc_comments(&self) -> &SingleThreadedComments {
        &self.0
    }

    /**
     * Check for `/*@__PURE__*/`, by exact text
     */
    pub fn has_pure(&self, pos: BytePos) -> bool {
        self.has_block_comment(pos, PURE_ANNOTATION)
    }

    /// Attaches `/*@__PURE__*/` in front of the node starting at `pos`.
    /// Returns false when the position already carries one.
    pub fn add_pure(&self, pos: BytePos) -> bool {
        if pos.is_dummy() {
            warn!("cannot annotate a synthesized node as pure");
            return false;
        }
        if self.has_pure(pos) {
            return false;
        }
        self.0.add_leading(pos, block_comment(PURE_ANNOTATION));
        true
    }

    pub fn has_block_comment(&self, pos: BytePos, text: &str) -> bool {
        self.find_comment(pos, |c| c.kind == CommentKind::Block && &*c.text == text)
    }

    /// Inserts a block comment before every comment already attached at `pos`.
    pub fn prepend_block_comment(&self, pos: BytePos, text: &str) {
        let mut comments = vec![block_comment(text)];
        if let Some(existing) = self.0.take_leading(pos) {
            comments.extend(existing);
        }
        self.0.add_leading_comments(pos, comments);
    }

    fn find_comment<F>(&self, pos: BytePos, op: F) -> bool
    where
        F: FnMut(&Comment) -> bool,
    {
        self.0
            .get_leading(pos)
            .map(|cs| cs.iter().any(op))
            .unwrap_or(false)
    }
}

fn block_comment(text: &str) -> Comment {
    Comment {
        kind: CommentKind::Block,
        span: DUMMY_SP,
        text: text.into(),
    }
}
