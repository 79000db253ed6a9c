use crate::error::ScoringError;

/// One score as reported by an index-keyed rerank backend.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IndexedScore {
    pub index: usize,
    pub score: f32,
}

/// Places index-keyed scores back into input order.
///
/// Every position in `0..len` must be scored exactly once.
pub fn positional_scores(
    len: usize,
    items: impl IntoIterator<Item = IndexedScore>,
) -> Result<Vec<f32>, ScoringError> {
    let mut slots = vec![None::<f32>; len];
    for item in items {
        let Some(slot) = slots.get_mut(item.index) else {
            return Err(ScoringError::InvalidResponse(format!(
                "score index {} out of range for {len} texts",
                item.index
            )));
        };
        if slot.is_some() {
            return Err(ScoringError::InvalidResponse(format!(
                "score index {} reported more than once",
                item.index
            )));
        }
        *slot = Some(item.score);
    }

    slots
        .into_iter()
        .enumerate()
        .map(|(index, slot)| {
            slot.ok_or_else(|| {
                ScoringError::InvalidResponse(format!("no score returned for text {index}"))
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(index: usize, score: f32) -> IndexedScore {
        IndexedScore { index, score }
    }

    #[test]
    fn restores_input_order_from_sorted_items() {
        let scores = positional_scores(3, vec![item(2, 0.9), item(0, 0.5), item(1, 0.1)])
            .expect("positional scores");
        assert_eq!(scores, vec![0.5, 0.1, 0.9]);
    }

    #[test]
    fn rejects_out_of_range_index() {
        let err = positional_scores(2, vec![item(0, 0.5), item(2, 0.4)]).unwrap_err();
        assert!(matches!(err, ScoringError::InvalidResponse(msg) if msg.contains("out of range")));
    }

    #[test]
    fn rejects_repeated_index() {
        let err = positional_scores(2, vec![item(1, 0.5), item(1, 0.4)]).unwrap_err();
        assert!(matches!(err, ScoringError::InvalidResponse(msg) if msg.contains("more than once")));
    }

    #[test]
    fn rejects_missing_index() {
        let err = positional_scores(3, vec![item(0, 0.5), item(2, 0.4)]).unwrap_err();
        assert!(matches!(err, ScoringError::InvalidResponse(msg) if msg.contains("text 1")));
    }

    #[test]
    fn empty_batch_has_no_scores() {
        let scores = positional_scores(0, Vec::new()).expect("empty");
        assert!(scores.is_empty());
    }
}
