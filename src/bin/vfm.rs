use std::env;
use std::path::PathBuf;
use std::process;

use vfm_ident::{export_problem, solve_problem, CancelFlag, SignalGuard, VfmInput, VfmProblem};

fn main() {
    println!("===========================================================================");
    println!("                        VIRTUAL FIELDS METHOD (VFM)                        ");
    println!("===========================================================================");
    println!();

    let mut args: Vec<String> = env::args().skip(1).collect();
    if let Some(pos) = args.iter().position(|a| a == "--debug") {
        args.remove(pos);
        vfm_ident::diag::set_level(vfm_ident::diag::LogLevel::Debug);
    }
    if args.len() != 1 {
        eprintln!("usage: vfm [--debug] <input.xml>");
        process::exit(2);
    }
    let input_path = PathBuf::from(&args[0]);

    println!("...........................................................................");
    println!("                                   SETUP                                   ");
    println!("...........................................................................");
    println!();

    let input = match VfmInput::from_file(&input_path) {
        Ok(input) => input,
        Err(e) => {
            eprintln!("ERROR: {}", e);
            process::exit(1);
        }
    };
    println!("Parsed {}", input_path.display());
    input.print_summary();
    println!();

    let mut problem = match VfmProblem::from_input(&input) {
        Ok(problem) => problem,
        Err(e) => {
            eprintln!("ERROR: {}", e);
            process::exit(1);
        }
    };
    println!("Setup complete.");
    problem.print_summary();
    println!();

    println!("...........................................................................");
    println!("                                    RUN                                    ");
    println!("...........................................................................");
    println!();

    // Bind SIGINT to the cancellation flag for the duration of the solve
    let cancel = CancelFlag::new();
    let guard = match SignalGuard::install(&cancel) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("ERROR: {}", e);
            process::exit(1);
        }
    };

    let outcome = solve_problem(&mut problem, &cancel);
    drop(guard);

    if let Err(e) = outcome {
        eprintln!("ERROR: {}", e);
        process::exit(1);
    }

    let plot_path = input_path.with_extension("vfp");
    if let Err(e) = export_problem(&problem, &plot_path) {
        eprintln!("ERROR: {}", e);
        process::exit(1);
    }

    println!();
    println!("Optimization complete.");
}
