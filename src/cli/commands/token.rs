use clap::Args;

use crate::auth::{generate_jwt, Claims, ADMIN_ROLE};
use crate::config::AppConfig;

#[derive(Args, Debug)]
pub struct TokenArgs {
    #[arg(long, default_value = ADMIN_ROLE, help = "Role claim: admin or voter")]
    pub role: String,

    #[arg(long, default_value = "cli", help = "Subject claim")]
    pub subject: String,

    #[arg(long, help = "Lifetime in hours (defaults to SECURITY_JWT_EXPIRY_HOURS)")]
    pub hours: Option<u64>,
}

pub fn handle(args: TokenArgs, config: AppConfig) -> anyhow::Result<()> {
    let hours = args.hours.unwrap_or(config.security.jwt_expiry_hours);
    let claims = Claims::new(args.subject, args.role, hours);
    let token = generate_jwt(&config.security, &claims)?;
    println!("{}", token);
    Ok(())
}
