use stock_chaser_lib::error::AppError;
use std::process::ExitCode;

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().skip(1).collect();

    match stock_chaser_lib::run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("stock-chaser: {:#}", e);
            let code = e.downcast_ref::<AppError>().map(AppError::exit_code).unwrap_or(1);
            ExitCode::from(code)
        }
    }
}
