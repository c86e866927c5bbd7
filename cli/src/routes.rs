use arbor::metadata::{self, load_circuit, save_circuit, save_circuit_as};
use arbor::{
    Circuit, CircuitBuilder, CircuitError, DataMatrix, LogHandler,
    SplitCriterion, SummaryStatistics,
};
use log::info;
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256Plus;

use crate::opt;
use crate::utils::print_table;

fn load_data(path: &std::path::Path) -> Option<DataMatrix> {
    match DataMatrix::load(path) {
        Ok(data) => Some(data),
        Err(err) => {
            eprintln!("Could not load data from {path:?}: {err}");
            None
        }
    }
}

fn describe(summary: &SummaryStatistics) -> String {
    match summary {
        SummaryStatistics::Continuous {
            min,
            max,
            mean,
            variance,
            ..
        } => format!(
            "min={min:.4} max={max:.4} mean={mean:.4} var={variance:.4}"
        ),
        SummaryStatistics::Categorical { counts, mode } => {
            format!("counts={counts:?} mode={mode}")
        }
        SummaryStatistics::None => String::from("-"),
    }
}

pub fn info(cmd: opt::InfoArgs) -> i32 {
    let Some(data) = load_data(&cmd.data) else {
        return 1;
    };

    println!("Rows: {}", data.n_rows());
    println!("Columns: {}", data.n_cols());

    let header = vec![
        String::from("Index"),
        String::from("Name"),
        String::from("Kind"),
        String::from("Summary"),
    ];
    let rows: Vec<Vec<String>> = (0..data.n_cols())
        .map(|col_ix| {
            vec![
                format!("{col_ix}"),
                data.schema().col_name(col_ix),
                format!("{}", data.coltype(col_ix)),
                describe(&data.summarize(col_ix)),
            ]
        })
        .collect();

    print_table(&header, &rows);
    0
}

pub fn build(cmd: opt::BuildArgs) -> i32 {
    let config = match cmd.build_config() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("Invalid build config: {err}");
            return 1;
        }
    };

    let Some(data) = load_data(&cmd.data) else {
        return 1;
    };

    let builder = CircuitBuilder::new(config)
        .with_independence_test(cmd.independence_test)
        .with_split_criterion(SplitCriterion {
            categorical_impurity: cmd.impurity,
        });

    let circuit = match builder.build_with_handler(&data, LogHandler) {
        Ok(circuit) => circuit,
        Err(err) => {
            eprintln!("Failed to build circuit: {err}");
            return 1;
        }
    };

    let save_res = match cmd.output_format {
        Some(ser_type) => save_circuit_as(&circuit, &cmd.output, ser_type),
        None => save_circuit(&circuit, &cmd.output),
    };
    if let Err(err) = save_res {
        eprintln!("Could not save circuit: {err}");
        return 1;
    }

    print_stats(&circuit);
    0
}

fn print_stats(circuit: &Circuit) {
    let stats = circuit.stats();
    let header = vec![
        String::from("Nodes"),
        String::from("Sum"),
        String::from("Product"),
        String::from("Leaf"),
        String::from("Depth"),
    ];
    let row = vec![
        format!("{}", stats.n_nodes),
        format!("{}", stats.n_sum),
        format!("{}", stats.n_product),
        format!("{}", stats.n_leaf),
        format!("{}", stats.depth),
    ];
    print_table(&header, &[row]);
}

/// The structural property a circuit defect violates
fn violated_property(err: &CircuitError) -> &'static str {
    match err {
        CircuitError::NotSmooth { .. } => "smooth",
        CircuitError::NotDecomposable { .. } => "decomposable",
        CircuitError::WeightCountMismatch { .. }
        | CircuitError::InvalidWeights { .. }
        | CircuitError::InvalidLeafParams { .. } => "normalized",
        _ => "well formed",
    }
}

pub fn check(cmd: opt::CheckArgs) -> i32 {
    match load_circuit(&cmd.circuit) {
        Ok(circuit) => {
            println!("smooth: yes");
            println!("decomposable: yes");
            println!("normalized: yes");
            print_stats(&circuit);
            0
        }
        Err(metadata::Error::InvalidCircuit(err)) => {
            println!("{}: no", violated_property(&err));
            eprintln!("Invalid circuit: {err}");
            1
        }
        Err(err) => {
            eprintln!("Could not load circuit: {err}");
            1
        }
    }
}

pub fn loglike(cmd: opt::LoglikeArgs) -> i32 {
    let circuit = match load_circuit(&cmd.circuit) {
        Ok(circuit) => circuit,
        Err(err) => {
            eprintln!("Could not load circuit: {err}");
            return 1;
        }
    };

    let Some(data) = load_data(&cmd.data) else {
        return 1;
    };

    let lls = match circuit.ln_likelihoods(&data) {
        Ok(lls) => lls,
        Err(err) => {
            eprintln!("Could not score data: {err}");
            return 1;
        }
    };

    if cmd.per_row {
        lls.iter().for_each(|ll| println!("{ll}"));
    } else {
        println!("{}", arbor::utils::stats::mean(lls.iter().copied()));
    }
    0
}

pub fn sample(cmd: opt::SampleArgs) -> i32 {
    let circuit = match load_circuit(&cmd.circuit) {
        Ok(circuit) => circuit,
        Err(err) => {
            eprintln!("Could not load circuit: {err}");
            return 1;
        }
    };

    let mut rng = match cmd.seed {
        Some(seed) => Xoshiro256Plus::seed_from_u64(seed),
        None => Xoshiro256Plus::from_entropy(),
    };

    info!("Drawing {} samples", cmd.n);
    let samples = circuit.sample_n(cmd.n, &mut rng);

    match samples.save(&cmd.output) {
        Ok(()) => 0,
        Err(err) => {
            eprintln!("Could not write samples to {:?}: {err}", cmd.output);
            1
        }
    }
}
