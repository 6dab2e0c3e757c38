use serde_json::json;

use localrag_core::error::Error;
use localrag_core::types::{Chunk, Record};
use localrag_vector::VectorIndex;

fn chunk(content: &str, chunk_id: usize) -> Chunk {
    Chunk { content: content.to_string(), source: "doc.txt".to_string(), title: "doc".to_string(), chunk_id }
}

fn record(name: &str) -> Record {
    let mut r = Record::new();
    r.insert("name".to_string(), json!(name));
    r
}

fn two_axis_index() -> VectorIndex<Chunk> {
    let mut index = VectorIndex::new(2).unwrap();
    index.add(&[[1.0f32, 0.0], [0.0, 1.0]], vec![chunk("east", 0), chunk("north", 1)]).unwrap();
    index
}

#[test]
fn exact_match_ranks_first_with_unit_score() {
    let index = two_axis_index();
    let results = index.search(&[1.0, 0.0], 1).unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].metadata.content, "east");
    assert!((results[0].similarity_score - 1.0).abs() < 1e-6);
    assert_eq!(results[0].rank, 1);
}

#[test]
fn ties_go_to_first_inserted() {
    let index = two_axis_index();
    let results = index.search(&[0.7, 0.7], 2).unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(results[0].metadata.content, "east");
    assert_eq!(results[1].metadata.content, "north");
    assert_eq!(results[0].similarity_score, results[1].similarity_score);
    assert!((results[0].similarity_score - std::f32::consts::FRAC_1_SQRT_2).abs() < 1e-5);
    assert_eq!((results[0].rank, results[1].rank), (1, 2));
}

#[test]
fn k_larger_than_len_returns_everything_in_order() {
    let mut index: VectorIndex = VectorIndex::new(3).unwrap();
    let vectors: Vec<Vec<f32>> = vec![
        vec![1.0, 0.2, 0.0],
        vec![0.1, 1.0, 0.3],
        vec![0.9, 0.9, 0.9],
        vec![-1.0, 0.0, 0.5],
        vec![0.0, 0.0, 2.0],
    ];
    let metadata = (0..vectors.len()).map(|i| record(&format!("r{i}"))).collect();
    index.add(&vectors, metadata).unwrap();

    let results = index.search(&[1.0, 0.5, 0.25], vectors.len() + 10).unwrap();
    assert_eq!(results.len(), vectors.len());
    for (i, r) in results.iter().enumerate() {
        assert_eq!(r.rank, i + 1);
        assert!((-1.0..=1.0 + 1e-6).contains(&r.similarity_score));
    }
    for pair in results.windows(2) {
        assert!(pair[0].similarity_score >= pair[1].similarity_score);
    }
}

#[test]
fn top_k_selection_matches_full_sort() {
    let mut index: VectorIndex = VectorIndex::new(4).unwrap();
    let vectors: Vec<Vec<f32>> = (0..40)
        .map(|i| {
            let x = i as f32;
            vec![(x * 0.37).sin(), (x * 0.11).cos(), (x * 0.73).sin() + 1.1, x % 5.0 - 2.0]
        })
        .collect();
    let metadata = (0..vectors.len()).map(|i| record(&i.to_string())).collect();
    index.add(&vectors, metadata).unwrap();

    let query = [0.3f32, -0.2, 0.8, 0.1];
    let all = index.search(&query, 40).unwrap();
    let top = index.search(&query, 7).unwrap();
    assert_eq!(top.len(), 7);
    assert_eq!(&all[..7], &top[..]);
}

#[test]
fn scaling_the_query_does_not_change_results() {
    let index = two_axis_index();
    let base = index.search(&[0.3, 0.9], 2).unwrap();
    for c in [1e-25f32, 0.001, 2.0, 3.5, 1000.0, 1e20] {
        let scaled = index.search(&[0.3 * c, 0.9 * c], 2).unwrap();
        assert_eq!(scaled.len(), base.len());
        for (a, b) in base.iter().zip(&scaled) {
            assert_eq!(a.metadata, b.metadata);
            assert_eq!(a.rank, b.rank);
            assert!((a.similarity_score - b.similarity_score).abs() < 1e-6);
        }
    }
}

#[test]
fn extreme_magnitudes_are_not_degenerate() {
    let mut index: VectorIndex = VectorIndex::new(2).unwrap();
    index.add(&[[1e20f32, 1e20], [1e-25, 0.0]], vec![record("huge"), record("tiny")]).unwrap();

    let huge = index.vector(0).unwrap();
    assert!((huge[0] - std::f32::consts::FRAC_1_SQRT_2).abs() < 1e-6);
    assert!((huge[1] - std::f32::consts::FRAC_1_SQRT_2).abs() < 1e-6);
    assert_eq!(index.vector(1).unwrap(), &[1.0, 0.0]);

    let results = index.search(&[3e30, 0.0], 2).unwrap();
    assert_eq!(results[0].metadata, record("tiny"));
    assert!((results[0].similarity_score - 1.0).abs() < 1e-6);
}

#[test]
fn infinite_component_is_degenerate() {
    let mut index: VectorIndex = VectorIndex::new(2).unwrap();
    let err = index.add(&[[f32::INFINITY, 1.0]], vec![record("inf")]).unwrap_err();
    assert!(matches!(err, Error::DegenerateVector { position: 0 }));
    assert!(index.is_empty());
}

#[test]
fn stored_vectors_are_unit_length() {
    let mut index: VectorIndex = VectorIndex::new(2).unwrap();
    index.add(&[[3.0f32, 4.0]], vec![record("a")]).unwrap();
    let v = index.vector(0).unwrap();
    assert!((v[0] - 0.6).abs() < 1e-6 && (v[1] - 0.8).abs() < 1e-6);
    assert!(index.vector(1).is_none());
}

#[test]
fn wrong_dimension_is_rejected_without_side_effects() {
    let mut index = two_axis_index();
    let err = index.add(&[vec![1.0f32, 2.0, 3.0]], vec![chunk("bad", 2)]).unwrap_err();
    assert!(matches!(err, Error::DimensionMismatch { expected: 2, actual: 3 }));
    assert_eq!(index.len(), 2);

    let err = index.search(&[1.0, 0.0, 0.0], 1).unwrap_err();
    assert!(matches!(err, Error::DimensionMismatch { expected: 2, actual: 3 }));
}

#[test]
fn zero_vector_rejects_whole_batch() {
    let mut index = two_axis_index();
    let err = index
        .add(&[[0.5f32, 0.5], [0.0, 0.0]], vec![chunk("ok", 2), chunk("zero", 3)])
        .unwrap_err();
    assert!(matches!(err, Error::DegenerateVector { position: 1 }));
    assert_eq!(index.len(), 2);

    let err = index.add(&[[f32::NAN, 1.0]], vec![chunk("nan", 2)]).unwrap_err();
    assert!(matches!(err, Error::DegenerateVector { position: 0 }));
    assert_eq!(index.len(), 2);
}

#[test]
fn zero_query_is_rejected() {
    let index = two_axis_index();
    assert!(matches!(index.search(&[0.0, 0.0], 1), Err(Error::DegenerateVector { .. })));
}

#[test]
fn mismatched_metadata_length_is_rejected() {
    let mut index: VectorIndex = VectorIndex::new(2).unwrap();
    let err = index.add(&[[1.0f32, 0.0]], vec![record("a"), record("b")]).unwrap_err();
    assert!(matches!(err, Error::LengthMismatch { vectors: 1, metadata: 2 }));
    assert!(index.is_empty());
}

#[test]
fn empty_index_and_zero_k_return_nothing() {
    let index: VectorIndex = VectorIndex::new(2).unwrap();
    assert!(index.search(&[1.0, 0.0], 5).unwrap().is_empty());
    assert!(two_axis_index().search(&[1.0, 0.0], 0).unwrap().is_empty());
}

#[test]
fn zero_dimension_is_invalid() {
    assert!(matches!(VectorIndex::<Record>::new(0), Err(Error::InvalidConfig(_))));
}

#[cfg(target_pointer_width = "64")]
#[test]
fn dimension_beyond_header_width_is_invalid() {
    let too_wide = u32::MAX as usize + 1;
    assert!(matches!(VectorIndex::<Record>::new(too_wide), Err(Error::InvalidConfig(_))));
    assert!(VectorIndex::<Record>::new(u32::MAX as usize).is_ok());
}

#[test]
fn add_appends_in_order() {
    let mut index = two_axis_index();
    index.add(&[[1.0f32, 1.0]], vec![chunk("diagonal", 2)]).unwrap();
    index.add::<[f32; 2]>(&[], Vec::new()).unwrap();
    assert_eq!(index.len(), 3);
    assert_eq!(index.metadata(0).unwrap().content, "east");
    assert_eq!(index.metadata(2).unwrap().content, "diagonal");
}

#[test]
fn search_result_serializes_as_record_plus_score_and_rank() {
    let index = two_axis_index();
    let results = index.search(&[1.0, 0.0], 1).unwrap();
    let value = serde_json::to_value(&results[0]).unwrap();
    assert_eq!(value["content"], "east");
    assert_eq!(value["source"], "doc.txt");
    assert_eq!(value["title"], "doc");
    assert_eq!(value["chunk_id"], 0);
    assert_eq!(value["rank"], 1);
    assert!(value["similarity_score"].as_f64().unwrap() > 0.99);
}
