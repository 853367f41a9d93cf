//! 엣지 (독립적인 강세 조건) 집계.
//!
//! 포지션 크기 보너스에 쓰이며, 판정할 수 없는 엣지는 세지 않습니다.

use serde::{Deserialize, Serialize};

use crate::predicate::{EvalContext, Predicate};

/// 엣지 정의.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeSpec {
    /// 엣지 ID
    pub id: String,
    /// 충족 조건
    pub when: Predicate,
}

impl EdgeSpec {
    pub fn new(id: impl Into<String>, when: Predicate) -> Self {
        Self {
            id: id.into(),
            when,
        }
    }
}

/// 충족된 엣지 ID 목록 (선언 순서).
pub fn present_edges(edges: &[EdgeSpec], ctx: &EvalContext<'_>) -> Vec<String> {
    edges
        .iter()
        .filter(|e| e.when.evaluate(ctx) == Some(true))
        .map(|e| e.id.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use verdict_core::{IndicatorBag, IndicatorView};

    #[test]
    fn test_only_true_edges_count() {
        let edges = vec![
            EdgeSpec::new("pocket_pivot", Predicate::is_true("pocket_pivot")),
            EdgeSpec::new("rs_leader", Predicate::at_least("rs_percentile", 90.0)),
            EdgeSpec::new("volume_dry_up", Predicate::is_true("volume_dry_up")),
        ];
        let bag = IndicatorBag::new()
            .with_flag("pocket_pivot", true)
            .with_number("rs_percentile", 85.0);
        let ctx = EvalContext::new(IndicatorView::new(&bag, None), &[]);

        assert_eq!(present_edges(&edges, &ctx), vec!["pocket_pivot".to_string()]);
    }
}
