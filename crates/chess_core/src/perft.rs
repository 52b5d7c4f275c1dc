use crate::{board::Position, movegen::legal_moves_into, types::Move};

/// Counts the leaf nodes of the legal move tree down to `depth`.
pub fn perft(pos: &mut Position, depth: u8) -> u64 {
    fn walk(pos: &mut Position, depth: u8, buffers: &mut [Vec<Move>]) -> u64 {
        let Some((buf, deeper)) = buffers.split_first_mut() else {
            return 1;
        };

        legal_moves_into(pos, buf);
        if depth == 1 {
            return buf.len() as u64;
        }

        let mut nodes = 0u64;
        for mv in buf.iter().copied() {
            let undo = pos.make_move(mv);
            nodes += walk(pos, depth - 1, deeper);
            pos.unmake_move(mv, undo);
        }
        nodes
    }

    // One move buffer per ply.
    let mut buffers = vec![Vec::with_capacity(64); depth as usize];
    walk(pos, depth, &mut buffers)
}

/// Per-move node counts at the root, sorted by UCI text.
pub fn divide(pos: &mut Position, depth: u8) -> Vec<(Move, u64)> {
    let mut root = Vec::new();
    legal_moves_into(pos, &mut root);
    let mut counts: Vec<(Move, u64)> = root
        .into_iter()
        .map(|mv| {
            let undo = pos.make_move(mv);
            let nodes = perft(pos, depth.saturating_sub(1));
            pos.unmake_move(mv, undo);
            (mv, nodes)
        })
        .collect();
    counts.sort_by_key(|(mv, _)| mv.to_string());
    counts
}
