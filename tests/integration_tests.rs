// End-to-end checks: marker YAML -> feature selection -> per-group statistics -> reports.

#[cfg(test)]
mod integration_tests {
    use std::path::PathBuf;

    use approx::assert_abs_diff_eq;
    use nalgebra_sparse::{CooMatrix, CsrMatrix};
    use ndarray::array;
    use single_markers::aggregation::{GroupMasks, GroupStats};
    use single_markers::expression::get_expr;
    use single_markers::markers::{MarkerHierarchy, read_yaml};
    use single_markers::reporting::{AnnotationOptions, AnnotationTable, LevelAssignment, to_long};
    use single_markers::MarkerError;

    fn fixture(name: &str) -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("tests")
            .join("data")
            .join(name)
    }

    fn brain() -> MarkerHierarchy {
        read_yaml(fixture("brain_markers.yaml")).unwrap()
    }

    // 4 cells x 5 genes: STMN2, GFAP, ACTB, DCX, AQP4
    fn counts() -> CsrMatrix<f64> {
        let coo = CooMatrix::try_from_triplets(
            4,
            5,
            vec![0, 0, 1, 1, 2, 2, 3],
            vec![0, 3, 0, 2, 1, 4, 1],
            vec![4.0, 2.0, 6.0, 9.0, 5.0, 1.0, 3.0],
        )
        .unwrap();
        CsrMatrix::from(&coo)
    }

    const VAR_NAMES: [&str; 5] = ["STMN2", "GFAP", "ACTB", "DCX", "AQP4"];

    #[test]
    fn test_hierarchy_from_file() {
        let h = brain();
        assert_eq!(h.depth(), 3);
        assert_eq!(
            h.names().collect::<Vec<_>>(),
            vec!["Neuron", "Astrocyte", "Microglia"]
        );
        assert!(h.get("Microglia").unwrap().is_leaf());

        let per_level: Vec<usize> = (0..h.depth()).map(|l| h.level(l).len()).collect();
        assert_eq!(per_level, vec![3, 2, 1]);

        let binary = h.to_binary();
        assert_eq!(binary.groups, vec!["Neuron", "Astrocyte", "Microglia"]);
        assert_eq!(binary.ncols(), 7);
        assert_eq!(binary.get("Astrocyte", "AQP4"), Some(1));
        assert_eq!(binary.get("Neuron", "AQP4"), Some(0));
    }

    #[test]
    fn test_missing_marker_genes_in_file() {
        let err = read_yaml(fixture("missing_markers.yaml")).unwrap_err();
        match err.downcast_ref::<MarkerError>() {
            Some(MarkerError::Configuration { path, .. }) => {
                assert_eq!(path, "Neuron.Excitatory")
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(read_yaml(fixture("does_not_exist.yaml")).is_err());
    }

    #[test]
    fn test_cluster_statistics_pipeline() {
        let h = brain();
        let genes = h.all_marker_genes();
        let (expr, features) = get_expr(&counts(), &VAR_NAMES, Some(genes.as_slice())).unwrap();
        assert_eq!(features, vec!["STMN2", "GFAP", "DCX", "AQP4"]);
        assert_eq!(
            expr,
            array![
                [4.0, 0.0, 2.0, 0.0],
                [6.0, 0.0, 0.0, 0.0],
                [0.0, 5.0, 0.0, 1.0],
                [0.0, 3.0, 0.0, 0.0]
            ]
        );

        let clusters = GroupMasks::from_labels(&["neuronal", "neuronal", "glial", "glial"]);
        let stats = clusters.stats(expr.view()).unwrap();
        assert_eq!(stats.group_sizes, vec![2, 2]);
        assert!(stats.empty_groups().is_empty());
        assert_eq!(stats.max, array![[6.0, 0.0, 2.0, 0.0], [0.0, 5.0, 0.0, 1.0]]);
        assert_abs_diff_eq!(
            stats.mean,
            array![[5.0, 0.0, 1.0, 0.0], [0.0, 4.0, 0.0, 0.5]],
            epsilon = 1e-12
        );
        assert_abs_diff_eq!(
            stats.frac_nonzero,
            array![[1.0, 0.0, 0.5, 0.0], [0.0, 1.0, 0.0, 0.5]],
            epsilon = 1e-12
        );

        let records = to_long(stats.mean.view(), clusters.groups(), &features).unwrap();
        assert_eq!(records.len(), 8);
        assert_eq!(records[1].group, "neuronal");
        assert_eq!(records[1].feature, "GFAP");
        assert_eq!(records[5].group, "glial");
        assert_eq!(records[5].feature, "GFAP");
        assert_abs_diff_eq!(records[5].value, 4.0);
    }

    #[test]
    fn test_multilevel_annotation() {
        let h = brain();
        let (expr, features) = get_expr(&counts(), &VAR_NAMES, None::<&[&str]>).unwrap();
        let clusters = GroupMasks::from_labels(&["c0", "c0", "c1", "c1"]);
        let mean = clusters.mean(expr.view()).unwrap();

        // top level: pick the class with the highest mean marker expression per cluster
        let top = h.level(0);
        let mut assignments = Vec::new();
        for (row, cluster) in clusters.groups().iter().enumerate() {
            let best = top
                .iter()
                .map(|(name, node)| {
                    let score: f64 = node
                        .marker_genes
                        .iter()
                        .filter_map(|g| features.iter().position(|f| f == g))
                        .map(|col| mean[[row, col]])
                        .sum();
                    (*name, score)
                })
                .fold(("", f64::MIN), |best, cur| if cur.1 > best.1 { cur } else { best });
            assignments.push(LevelAssignment::new(cluster.clone(), best.0, best.1));
        }

        let table = AnnotationTable::from_levels(
            vec![(1, assignments)],
            &AnnotationOptions::default(),
        );
        assert_eq!(table.get("c0", "1"), Some("Neuron"));
        assert_eq!(table.get("c1", "1"), Some("Astrocyte"));
    }
}
