use super::{IR, IRProgram, VMOp};
use bumpalo::Bump;

/// do peephole optimizations and constant folding on the IR graph
pub fn optimize_peephole<'a>(program: &IRProgram<'a>, arena: &'a Bump) -> IRProgram<'a> {
    program.rewrite(arena, |ir| single_peephole(arena, ir))
}

fn single_peephole<'a>(arena: &'a Bump, ir: IR<'a>) -> IR<'a> {
    use VMOp::*;

    let lit = |x: i32| IR::new(arena, LitI(x, ()));
    let mask = |x: bool| lit(if x { -1 } else { 0 });

    match *ir.0 {
        AddI(a, b, _) => match (a.lit_i(), b.lit_i()) {
            (Some(x), Some(y)) => lit(x.wrapping_add(y)),
            (Some(0), _) => b,
            (_, Some(0)) => a,
            _ => ir,
        },

        SubI(a, b, _) => match (a.lit_i(), b.lit_i()) {
            (Some(x), Some(y)) => lit(x.wrapping_sub(y)),
            (_, Some(0)) => a,
            _ if a == b => lit(0),
            _ => ir,
        },

        MulI(a, b, _) => match (a.lit_i(), b.lit_i()) {
            (Some(x), Some(y)) => lit(x.wrapping_mul(y)),
            (Some(0), _) | (_, Some(0)) => lit(0),
            (Some(1), _) => b,
            (_, Some(1)) => a,
            _ => ir,
        },

        DivI(a, b, _) => match (a.lit_i(), b.lit_i()) {
            (Some(x), Some(y)) => lit(x.checked_div(y).unwrap_or(0)),
            (Some(0), _) | (_, Some(0)) => lit(0),
            (_, Some(1)) => a,
            _ => ir,
        },

        DivU(a, b, _) => match (a.lit_i(), b.lit_i()) {
            (Some(x), Some(y)) => lit((x as u32).checked_div(y as u32).unwrap_or(0) as i32),
            (Some(0), _) | (_, Some(0)) => lit(0),
            (_, Some(1)) => a,
            _ => ir,
        },

        AndI(a, b, _) => match (a.lit_i(), b.lit_i()) {
            (Some(x), Some(y)) => lit(x & y),
            (Some(0), _) | (_, Some(0)) => lit(0),
            (Some(-1), _) => b,
            (_, Some(-1)) => a,
            _ if a == b => a,
            _ => ir,
        },

        MulF(a, b, _) => match (a.0, b.0) {
            (LitF(x, _), LitF(y, _)) => IR::new(arena, LitF(x * y, ())),
            (LitF(1.0, _), _) => b,
            (_, LitF(1.0, _)) => a,
            _ => ir,
        },

        CastF(a, _) => match a.lit_i() {
            Some(x) => IR::new(arena, LitF(x as f32, ())),
            None => ir,
        },

        CastUF(a, _) => match a.lit_i() {
            Some(x) => IR::new(arena, LitF(x as u32 as f32, ())),
            None => ir,
        },

        EqI(a, b, _) => match (a.lit_i(), b.lit_i()) {
            (Some(x), Some(y)) => mask(x == y),
            _ if a == b => mask(true),
            _ => ir,
        },

        LtI(a, b, _) => match (a.lit_i(), b.lit_i()) {
            (Some(x), Some(y)) => mask(x < y),
            _ if a == b => mask(false),
            _ => ir,
        },

        GtI(a, b, _) => match (a.lit_i(), b.lit_i()) {
            (Some(x), Some(y)) => mask(x > y),
            _ if a == b => mask(false),
            _ => ir,
        },

        LtU(a, b, _) => match (a.lit_i(), b.lit_i()) {
            (Some(x), Some(y)) => mask((x as u32) < (y as u32)),
            (_, Some(0)) => mask(false),
            _ if a == b => mask(false),
            _ => ir,
        },

        LeU(a, b, _) => match (a.lit_i(), b.lit_i()) {
            (Some(x), Some(y)) => mask((x as u32) <= (y as u32)),
            (Some(0), _) | (_, Some(-1)) => mask(true),
            _ if a == b => mask(true),
            _ => ir,
        },

        // splats and lane shuffles of a splat are the splat
        Extract(_, a, _) | Permute(a, _, _) if a.lit_i().is_some() => a,
        Shuffle(a, b, _, _) if a.lit_i().is_some() && a.lit_i() == b.lit_i() => a,

        ShuffleBytes(a, _, _) | Expand(_, a, _) if a.lit_i() == Some(0) => lit(0),

        // masked memory ops read nothing when no lane is enabled
        LoadIndicesMasked(ty, m, _) => match m.lit_i() {
            Some(0) => lit(0),
            Some(-1) => IR::new(arena, LoadIndices(ty, ())),
            _ => ir,
        },
        LoadIndex(_, _, v, _) | LoadVertex(_, _, _, v, _) | Gather(_, _, _, v, _) if v.lit_i() == Some(0) => lit(0),
        Gather(_, 0, _, _, _) => lit(0),

        _ => ir,
    }
}
