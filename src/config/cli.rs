use crate::domain::model::Address;
use crate::domain::requests::QuoteRequest;
use clap::{Args, Parser, Subcommand};

#[derive(Debug, Clone, Parser)]
#[command(name = "shipquote")]
#[command(about = "Quote shipping rates, book shipments and follow their tracking")]
pub struct CliConfig {
    /// Path to TOML configuration file (defaults to the bundled configuration)
    #[arg(short, long)]
    pub config: Option<String>,

    /// Directory holding shipments.json
    #[arg(long, default_value = "./data")]
    pub data_dir: String,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit logs as JSON")]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// List every carrier/service offer for a destination, cheapest first
    Quote(PackageArgs),

    /// Quote and book a shipment for an order
    Ship {
        #[arg(long)]
        order_id: String,

        /// Book this `carrier:service_type` instead of the cheapest offer
        #[arg(long)]
        service: Option<String>,

        #[arg(long, default_value = "")]
        recipient: String,

        #[arg(long, default_value = "")]
        street: String,

        #[arg(long, default_value = "")]
        city: String,

        #[arg(long, default_value = "")]
        state: String,

        #[command(flatten)]
        package: PackageArgs,
    },

    /// Show the status and event history of a tracking number
    Track { tracking_number: String },
}

#[derive(Debug, Clone, Args)]
pub struct PackageArgs {
    #[arg(long)]
    pub postal_code: String,

    /// Weight in kg
    #[arg(long)]
    pub weight: f64,

    #[arg(long, default_value = "0")]
    pub declared_value: f64,

    /// Dimensions in cm; omitted ones use the configured default package size
    #[arg(long)]
    pub length: Option<f64>,

    #[arg(long)]
    pub width: Option<f64>,

    #[arg(long)]
    pub height: Option<f64>,
}

impl From<&PackageArgs> for QuoteRequest {
    fn from(args: &PackageArgs) -> Self {
        QuoteRequest {
            destination_postal_code: args.postal_code.clone(),
            weight: args.weight,
            declared_value: args.declared_value,
            length: args.length,
            width: args.width,
            height: args.height,
        }
    }
}

impl Command {
    /// Destination address for `ship`; `None` for the other commands.
    pub fn destination(&self) -> Option<Address> {
        match self {
            Command::Ship {
                recipient,
                street,
                city,
                state,
                package,
                ..
            } => Some(Address {
                name: recipient.clone(),
                street: street.clone(),
                city: city.clone(),
                state: state.clone(),
                postal_code: package.postal_code.clone(),
                country: "MX".to_string(),
            }),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_quote_command() {
        let cli = CliConfig::parse_from([
            "shipquote",
            "quote",
            "--postal-code",
            "03100",
            "--weight",
            "2",
            "--length",
            "30",
        ]);

        match &cli.command {
            Command::Quote(args) => {
                let request = QuoteRequest::from(args);
                assert_eq!(request.destination_postal_code, "03100");
                assert_eq!(request.weight, 2.0);
                assert_eq!(request.length, Some(30.0));
                assert_eq!(request.width, None);
            }
            other => panic!("unexpected command {:?}", other),
        }
        assert_eq!(cli.data_dir, "./data");
    }

    #[test]
    fn test_parse_ship_command_builds_destination() {
        let cli = CliConfig::parse_from([
            "shipquote",
            "--verbose",
            "ship",
            "--order-id",
            "ORD-9",
            "--service",
            "dhl:economy",
            "--city",
            "Mérida",
            "--postal-code",
            "97000",
            "--weight",
            "1.5",
        ]);

        assert!(cli.verbose);
        let destination = cli.command.destination().unwrap();
        assert_eq!(destination.postal_code, "97000");
        assert_eq!(destination.city, "Mérida");
    }
}
