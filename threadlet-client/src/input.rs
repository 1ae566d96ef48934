use crate::api::CommentId;

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum InputMode {
    Reply,
    Edit,
}

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct ActiveInput {
    pub node: CommentId,
    pub mode: InputMode,
}

/// Single slot deciding which comment, if any, shows a reply or edit box.
///
/// Opening an input anywhere closes whatever was open before, without
/// keeping its draft.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct InputArbiter {
    active: Option<ActiveInput>,
}

impl InputArbiter {
    pub fn new() -> InputArbiter {
        InputArbiter::default()
    }

    pub fn active(&self) -> Option<ActiveInput> {
        self.active
    }

    /// Returns the input that got closed by this call, if any
    pub fn open(&mut self, node: CommentId, mode: InputMode) -> Option<ActiveInput> {
        self.active.replace(ActiveInput { node, mode })
    }

    pub fn close(&mut self) {
        self.active = None;
    }

    /// Closes the active input only if it is the one described
    pub fn close_if(&mut self, node: &CommentId, mode: InputMode) {
        if self.is_open_for(node, mode) {
            self.active = None;
        }
    }

    /// Closes the active input if it belongs to any of `nodes`
    pub fn close_for_any(&mut self, nodes: &[CommentId]) {
        if let Some(a) = self.active {
            if nodes.contains(&a.node) {
                self.active = None;
            }
        }
    }

    pub fn is_open_for(&self, node: &CommentId, mode: InputMode) -> bool {
        self.active == Some(ActiveInput { node: *node, mode })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::Uuid;

    #[test]
    fn opening_elsewhere_closes_previous() {
        let a = CommentId(Uuid::new_v4());
        let b = CommentId(Uuid::new_v4());
        let mut arb = InputArbiter::new();
        assert_eq!(arb.open(a, InputMode::Edit), None);
        assert!(arb.is_open_for(&a, InputMode::Edit));
        assert_eq!(
            arb.open(b, InputMode::Reply),
            Some(ActiveInput {
                node: a,
                mode: InputMode::Edit
            })
        );
        assert!(!arb.is_open_for(&a, InputMode::Edit));
        assert!(!arb.is_open_for(&a, InputMode::Reply));
        assert!(arb.is_open_for(&b, InputMode::Reply));
        arb.close();
        assert!(!arb.is_open_for(&b, InputMode::Reply));
    }

    #[test]
    fn switching_mode_on_same_node() {
        let a = CommentId(Uuid::new_v4());
        let mut arb = InputArbiter::new();
        arb.open(a, InputMode::Reply);
        arb.open(a, InputMode::Edit);
        assert!(arb.is_open_for(&a, InputMode::Edit));
        assert!(!arb.is_open_for(&a, InputMode::Reply));
        arb.close_if(&a, InputMode::Reply);
        assert!(arb.is_open_for(&a, InputMode::Edit));
        arb.close_for_any(&[a]);
        assert_eq!(arb.active(), None);
    }

    #[test]
    fn at_most_one_input_open() {
        let nodes = (0..4)
            .map(|_| CommentId(Uuid::new_v4()))
            .collect::<Vec<_>>();
        bolero::check!()
            .with_type::<Vec<(Option<u8>, bool)>>()
            .cloned()
            .for_each(|ops| {
                let mut arb = InputArbiter::new();
                // None closes, Some(node) opens an input on node
                for (node, edit) in ops {
                    let expected = match node {
                        Some(node) => {
                            let mode = match edit {
                                true => InputMode::Edit,
                                false => InputMode::Reply,
                            };
                            let node = nodes[usize::from(node) % nodes.len()];
                            arb.open(node, mode);
                            Some((node, mode))
                        }
                        None => {
                            arb.close();
                            None
                        }
                    };
                    let open = nodes
                        .iter()
                        .flat_map(|n| [(*n, InputMode::Reply), (*n, InputMode::Edit)])
                        .filter(|(n, m)| arb.is_open_for(n, *m))
                        .collect::<Vec<_>>();
                    assert!(open.len() <= 1);
                    assert_eq!(open.first().copied(), expected);
                }
            });
    }
}
