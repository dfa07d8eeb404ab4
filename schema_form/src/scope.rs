/* Back-reference scope for walking self-referential type trees */

use schema_types::TypeNode;

/* Stack of named definitions entered on the current branch.
 *
 * Each frame holds the anchor id and the anchor's body; a `Recursive(id)`
 * resolves to the body of the nearest frame with the same id. Re-entering
 * a body pushes another frame, so `occurrences` counts how many times a
 * definition is open on the branch. */
#[derive(Debug, Clone, Default)]
pub struct Scope<'t> {
    frames: Vec<(&'t str, &'t TypeNode)>,
}

impl<'t> Scope<'t> {
    pub fn new() -> Self {
        Self { frames: Vec::new() }
    }

    pub fn enter(&mut self, id: &'t str, body: &'t TypeNode) {
        self.frames.push((id, body));
    }

    pub fn leave(&mut self) {
        self.frames.pop();
    }

    pub fn lookup(&self, id: &str) -> Option<&'t TypeNode> {
        self.frames
            .iter()
            .rev()
            .find(|(frame_id, _)| *frame_id == id)
            .map(|(_, body)| *body)
    }

    pub fn occurrences(&self, id: &str) -> usize {
        self.frames.iter().filter(|(frame_id, _)| *frame_id == id).count()
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /* Step through anchors and back-references until a structural node.
     * Frames are pushed for every anchor passed; returns the structural
     * node and how many frames were pushed, or None for a dangling id. */
    pub fn descend(&mut self, mut node: &'t TypeNode) -> Option<(&'t TypeNode, usize)> {
        let mut pushed = 0;
        loop {
            match node {
                TypeNode::Named { id, node: body } => {
                    self.enter(id.as_str(), body.as_ref());
                    pushed += 1;
                    node = body.as_ref();
                }
                TypeNode::Recursive { id } => {
                    let Some(body) = self.lookup(id) else {
                        self.unwind(pushed);
                        return None;
                    };
                    self.enter(id.as_str(), body);
                    pushed += 1;
                    node = body;
                }
                _ => return Some((node, pushed)),
            }
        }
    }

    pub fn unwind(&mut self, frames: usize) {
        for _ in 0..frames {
            self.frames.pop();
        }
    }
}
