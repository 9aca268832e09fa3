//! Property test: assembled context never exceeds its token budget

use proptest::prelude::*;
use ragdesk_core::{tokens, Chunk, ContextAssembler, RetrievalHit};

fn hits_strategy() -> impl Strategy<Value = Vec<RetrievalHit>> {
    prop::collection::vec(
        ("[a-z ]{0,400}", 0.0f32..=1.0, 0i64..20),
        0..8,
    )
    .prop_map(|raw| {
        let mut hits: Vec<RetrievalHit> = raw
            .into_iter()
            .enumerate()
            .map(|(i, (text, similarity, index))| RetrievalHit {
                chunk: Chunk {
                    id: format!("c{}", i),
                    text,
                    source_file: format!("file{}.txt", i % 3),
                    chunk_index: index,
                    embedding: Vec::new(),
                },
                similarity,
                distance: 1.0 - similarity,
            })
            .collect();
        hits.sort_by(|a, b| {
            b.similarity
                .partial_cmp(&a.similarity)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        hits
    })
}

proptest! {
    #[test]
    fn budget_is_never_exceeded(hits in hits_strategy(), budget in 1usize..500) {
        let assembler = ContextAssembler::new(budget);
        let ctx = assembler.assemble(&hits);

        prop_assert!(ctx.token_count <= budget);
        prop_assert_eq!(ctx.token_count, tokens::count_tokens(&ctx.text));
        prop_assert!(ctx.source_hits.len() <= hits.len());
    }

    #[test]
    fn empty_hits_always_empty_context(budget in 1usize..500) {
        let assembler = ContextAssembler::new(budget);
        let ctx = assembler.assemble(&[]);
        prop_assert!(ctx.is_empty());
        prop_assert_eq!(ctx.token_count, 0);
    }
}
