use std::path::{Path, PathBuf};

use battery_plotter::chart::{render_html, save_html, YAxis};
use battery_plotter::data::{load_from_source, Column, MemorySource};
use battery_plotter::{LoadError, Pipeline, PipelineError, PlotSettings, SheetKind, Table};

/// A cell export folder with the time series split over two channel sheets.
fn write_cell(root: &Path, name: &str, offset: f64) -> PathBuf {
    let dir = root.join(name);
    std::fs::create_dir_all(&dir).unwrap();

    let header = "Test_Time(s),Current(A),Voltage(V)\n";
    let first = format!(
        "{header}{},0.000001,3.0\n{},0.000002,3.2\n{},0.000003,3.4\n",
        offset,
        offset + 1.0,
        offset + 2.0
    );
    let second = format!(
        "{header}{},0.000004,3.6\n{},-0.000005,3.8\n",
        offset + 3.0,
        offset + 4.0
    );
    std::fs::write(dir.join("Channel_1-006_1.csv"), first).unwrap();
    std::fs::write(dir.join("Channel_1-006_2.csv"), second).unwrap();
    std::fs::write(dir.join("Info.csv"), "Key,Value\nChannel,6\n").unwrap();
    dir
}

#[test]
fn test_two_cells_current_vs_voltage() {
    let root = tempfile::tempdir().unwrap();
    let files = vec![
        write_cell(root.path(), "cell_a", 0.0),
        write_cell(root.path(), "cell_b", 100.0),
    ];

    let settings = PlotSettings {
        x_column: "Test_Time(s)".into(),
        left_columns: vec!["Current(A)".into()],
        right_columns: vec!["Voltage(V)".into()],
        ..Default::default()
    };
    let output = Pipeline::new(settings).run(files).unwrap();

    assert!(output.skipped.is_empty());
    let rows: usize = output.datasets.iter().map(|d| d.table.len()).sum();
    assert_eq!(rows, 10);

    let chart = &output.chart;
    assert_eq!(chart.visible_traces().count(), 4);
    assert_eq!(chart.placeholder_traces().count(), 0);
    assert_eq!(chart.layout.yaxis.title.text, "Current(A) (µ)");
    assert_eq!(chart.layout.yaxis2.title.text, "Voltage(V)");

    let left: Vec<_> = chart.traces_on(YAxis::Left).collect();
    assert_eq!(left[0].name.as_deref(), Some("cell_a: Current(A) (µ)"));
    let last = left[0].y[4].as_f64().unwrap();
    assert!((last + 5.0).abs() < 1e-9);

    // The source datasets keep their original units.
    assert!(output.datasets[0].table.has_column("Current(A)"));
    assert!(!output.datasets[0].table.has_column("Current(A) (µ)"));

    let html = render_html(chart).unwrap();
    assert!(html.contains("Current(A) (µ)"));
}

#[test]
fn test_bad_file_is_skipped() {
    let root = tempfile::tempdir().unwrap();
    let good = write_cell(root.path(), "cell_a", 0.0);
    let stats_only = root.path().join("stats");
    std::fs::create_dir_all(&stats_only).unwrap();
    std::fs::write(stats_only.join("Statistics_1-006.csv"), "Cycle_Index\n1\n").unwrap();

    let output = Pipeline::new(PlotSettings::default())
        .run(vec![good, stats_only.clone()])
        .unwrap();

    assert_eq!(output.datasets.len(), 1);
    assert_eq!(output.skipped.len(), 1);
    assert_eq!(output.skipped[0].path, stats_only);
    assert!(matches!(
        output.skipped[0].error,
        LoadError::NoMatchingSheet { .. }
    ));
}

#[test]
fn test_statistics_sheets_by_cycle_index() {
    let root = tempfile::tempdir().unwrap();
    let dir = root.path().join("cell");
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(
        dir.join("Statistics_1-006.csv"),
        "Cycle_Index,Charge_Capacity(Ah),Discharge_Capacity(Ah)\n1,1.0,0.9\n2,0.0,0.8\n",
    )
    .unwrap();

    let mut settings = PlotSettings {
        sheet_kind: SheetKind::Statistics,
        x_column: "Cycle_Index".into(),
        left_columns: vec!["Coulombic Efficiency".into()],
        right_columns: vec!["Discharge_Capacity(Ah)".into()],
        ..Default::default()
    };
    settings.derived.coulombic_efficiency = true;

    let output = Pipeline::new(settings).run(vec![dir]).unwrap();
    let chart = &output.chart;

    let ce = chart.traces_on(YAxis::Left).next().unwrap();
    assert!((ce.y[0].as_f64().unwrap() - 0.9).abs() < 1e-12);
    assert!(ce.y[1].is_missing());
    assert_eq!(ce.marker.as_ref().map(|m| m.size), Some(10));
}

#[test]
fn test_nothing_loaded() {
    let err = Pipeline::default()
        .run(vec![PathBuf::from("/nonexistent/cell.xlsx")])
        .unwrap_err();
    assert!(matches!(err, PipelineError::NothingLoaded(1)));
}

#[test]
fn test_memory_source_merge() {
    let sheet = |t: &[f64]| Table::from_columns(vec![Column::numeric("Test_Time(s)", t)]);
    let mut source = MemorySource::new()
        .with_sheet("Channel_1-006_1", sheet(&[0.0, 1.0]))
        .with_sheet("Statistics_1-006", sheet(&[9.0]))
        .with_sheet("Channel_1-006_2", sheet(&[2.0]));

    let (table, columns) = load_from_source(&mut source, "memory", "Channel_1-").unwrap();
    assert_eq!(columns, vec!["Test_Time(s)"]);
    assert_eq!(
        table.column("Test_Time(s)").unwrap().numbers(),
        vec![Some(0.0), Some(1.0), Some(2.0)]
    );

    let err = load_from_source(&mut source, "memory", "Summary").unwrap_err();
    match err {
        LoadError::NoMatchingSheet { available, .. } => assert_eq!(available.len(), 3),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_save_html_into_output_dir() {
    let root = tempfile::tempdir().unwrap();
    let cell = write_cell(root.path(), "cell_a", 0.0);
    let output = Pipeline::new(PlotSettings::default()).run(vec![cell]).unwrap();

    let out_dir = root.path().join("saved_graphs");
    let path = save_html(&output.chart, &out_dir, "Cell A: C/10").unwrap();

    assert!(path.starts_with(&out_dir));
    assert_eq!(path.extension().and_then(|e| e.to_str()), Some("html"));
    let html = std::fs::read_to_string(&path).unwrap();
    assert!(path.file_name().unwrap().to_string_lossy().starts_with("Cell_A"));
    assert!(html.contains("Battery Data"));
}
