use clap::{Arg, Command};

pub fn with_args(command: Command) -> Command {
    let command = with_otp_args(command);
    let command = with_session_args(command);
    with_rate_limit_args(command)
}

fn with_otp_args(command: Command) -> Command {
    command
        .arg(
            Arg::new("otp-ttl-seconds")
                .long("otp-ttl-seconds")
                .help("One-time code TTL in seconds")
                .env("VARCO_OTP_TTL_SECONDS")
                .default_value("300")
                .value_parser(clap::value_parser!(i64)),
        )
        .arg(
            Arg::new("otp-max-attempts")
                .long("otp-max-attempts")
                .help("Max verification attempts before a code is invalidated")
                .env("VARCO_OTP_MAX_ATTEMPTS")
                .default_value("3")
                .value_parser(clap::value_parser!(i32)),
        )
        .arg(
            Arg::new("resend-cooldown-seconds")
                .long("resend-cooldown-seconds")
                .help("Cooldown before a new code can be requested for the same address")
                .env("VARCO_RESEND_COOLDOWN_SECONDS")
                .default_value("60")
                .value_parser(clap::value_parser!(i64)),
        )
}

fn with_session_args(command: Command) -> Command {
    command.arg(
        Arg::new("session-ttl-seconds")
            .long("session-ttl-seconds")
            .help("Session cookie TTL in seconds")
            .env("VARCO_SESSION_TTL_SECONDS")
            .default_value("604800")
            .value_parser(clap::value_parser!(i64)),
    )
}

fn with_rate_limit_args(command: Command) -> Command {
    command
        .arg(
            Arg::new("rate-limit-window-seconds")
                .long("rate-limit-window-seconds")
                .help("Fixed window size for per-request rate limiting")
                .env("VARCO_RATE_LIMIT_WINDOW_SECONDS")
                .default_value("60")
                .value_parser(clap::value_parser!(u64)),
        )
        .arg(
            Arg::new("rate-limit-max-requests")
                .long("rate-limit-max-requests")
                .help("Max requests per bucket within the rate limit window")
                .env("VARCO_RATE_LIMIT_MAX_REQUESTS")
                .default_value("10")
                .value_parser(clap::value_parser!(u32)),
        )
}
