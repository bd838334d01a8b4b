// synthlib test application -- CLI tool for exercising the device
// backends against real hardware, plus a solver inspector that shows the
// register plan a target frequency produces without touching a device.
//
// Usage:
//   synthlib-test-app --backend softrock freq get
//   synthlib-test-app --backend softrock freq set 7100000
//   synthlib-test-app --backend tentec --port /dev/ttyUSB0 freq set 14074000
//   synthlib-test-app --backend yaesu --port /dev/ttyUSB1 mode set usb
//   synthlib-test-app solve si570 7100000
//   synthlib-test-app solve cy27 7100000

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};

use synthlib::softrock::{models as softrock_models, SoftRockBuilder};
use synthlib::solver::{Cy27Solver, Si570Solver};
use synthlib::tentec::TentecBuilder;
use synthlib::yaesu::YaesuBuilder;
use synthlib::{format_freq_mhz, Mode, Tuner, Vfo};

/// synthlib test application -- exercises tuner backends from the
/// command line.
#[derive(Parser)]
#[command(name = "synthlib-test-app", version, about)]
struct Cli {
    /// Which backend to talk to.
    #[arg(long, value_enum)]
    backend: Option<Backend>,

    /// Serial port path (serial backends).
    #[arg(long)]
    port: Option<String>,

    /// Target VFO.
    #[arg(long, value_enum, default_value_t = VfoArg::A)]
    vfo: VfoArg,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Copy, ValueEnum)]
enum Backend {
    Softrock,
    Tentec,
    Yaesu,
}

#[derive(Clone, Copy, ValueEnum)]
enum VfoArg {
    A,
    B,
}

impl From<VfoArg> for Vfo {
    fn from(arg: VfoArg) -> Vfo {
        match arg {
            VfoArg::A => Vfo::A,
            VfoArg::B => Vfo::B,
        }
    }
}

#[derive(Subcommand)]
enum Command {
    /// Get or set the frequency.
    Freq {
        #[command(subcommand)]
        op: FreqOp,
    },
    /// Get or set the operating mode.
    Mode {
        #[command(subcommand)]
        op: ModeOp,
    },
    /// Key or unkey the transmitter.
    Ptt { on: bool },
    /// Show a solver's register plan for a target frequency (no device
    /// needed).
    Solve {
        /// Which solver: si570 or cy27.
        chip: String,
        /// Target chip output frequency in Hz.
        freq_hz: u64,
    },
}

#[derive(Subcommand)]
enum FreqOp {
    Get,
    Set { freq_hz: u64 },
}

#[derive(Subcommand)]
enum ModeOp {
    Get,
    Set { mode: String },
}

async fn connect(cli: &Cli) -> Result<Box<dyn Tuner>> {
    let backend = cli
        .backend
        .ok_or_else(|| anyhow::anyhow!("--backend is required for device commands"))?;

    Ok(match backend {
        Backend::Softrock => Box::new(
            SoftRockBuilder::new(softrock_models::si570_avr_usb())
                .build()
                .await
                .context("opening SoftRock tuner")?,
        ),
        Backend::Tentec => {
            let port = cli.port.as_deref().context("--port required for tentec")?;
            Box::new(
                TentecBuilder::new()
                    .serial_port(port)
                    .build()
                    .await
                    .context("opening Ten-Tec rig")?,
            )
        }
        Backend::Yaesu => {
            let port = cli.port.as_deref().context("--port required for yaesu")?;
            Box::new(
                YaesuBuilder::new()
                    .serial_port(port)
                    .build()
                    .await
                    .context("opening Yaesu rig")?,
            )
        }
    })
}

fn solve(chip: &str, freq_hz: u64) -> Result<()> {
    match chip {
        "si570" => {
            let solution = Si570Solver::default().solve(freq_hz as f64 / 1e6)?;
            let (int, frac) = solution.rfreq_parts();
            println!(
                "HS_DIV {}  N1 {}  DCO {:.4} MHz  RFREQ {}+{}/2^28",
                solution.hs_div_value(),
                solution.n1 + 1,
                solution.dco_mhz,
                int,
                frac
            );
            println!("registers 7..12: {:02X?}", solution.pack());
        }
        "cy27" => {
            let solver = Cy27Solver::new(10e6);
            let triple = solver.solve(freq_hz)?;
            let regs = triple.registers();
            println!(
                "P {}  Q {}  Div1N {}  VCO {:.3} MHz  out {}",
                triple.p,
                triple.q,
                triple.div1n,
                solver.vco_hz(&triple) / 1e6,
                format_freq_mhz((solver.clock_hz(&triple) / 4.0).round() as u64),
            );
            println!(
                "R40 {:02X}  R41 {:02X}  R42 {:02X}  DIV1 {:02X}  CLK3SRC {:02X}",
                regs.r40, regs.r41, regs.r42, regs.div1_reg, regs.clk3_src
            );
        }
        other => bail!("unknown chip {other:?}; expected si570 or cy27"),
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();

    match &cli.command {
        Command::Solve { chip, freq_hz } => solve(chip, *freq_hz)?,

        Command::Freq { op: FreqOp::Get } => {
            let rig = connect(&cli).await?;
            let freq = rig.get_frequency(cli.vfo.into()).await?;
            println!("{}", format_freq_mhz(freq));
        }
        Command::Freq {
            op: FreqOp::Set { freq_hz },
        } => {
            let rig = connect(&cli).await?;
            rig.set_frequency(cli.vfo.into(), *freq_hz).await?;
            println!("set to {}", format_freq_mhz(*freq_hz));
        }

        Command::Mode { op: ModeOp::Get } => {
            let rig = connect(&cli).await?;
            println!("{}", rig.get_mode().await?);
        }
        Command::Mode {
            op: ModeOp::Set { mode },
        } => {
            let rig = connect(&cli).await?;
            let mode: Mode = mode.parse().map_err(anyhow::Error::msg)?;
            rig.set_mode(mode).await?;
            println!("mode set to {mode}");
        }

        Command::Ptt { on } => {
            let rig = connect(&cli).await?;
            rig.set_ptt(*on).await?;
            println!("PTT {}", if *on { "on" } else { "off" });
        }
    }

    Ok(())
}
