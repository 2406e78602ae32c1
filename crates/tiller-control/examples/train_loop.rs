//! A long-running training loop whose hyperparameters can be adjusted over
//! HTTP while it runs.
//!
//! ```text
//! cargo run --example train_loop
//! curl -X PUT  localhost:4444/set/lr -H 'content-type: application/json' -d '2.0'
//! curl -X PATCH localhost:4444/set/checkpoints -H 'content-type: application/json' \
//!      -d '{"every_epochs": 5}'
//! curl -X PUT  localhost:4444/set/training_stopped -H 'content-type: application/json' -d 'true'
//! ```

use serde::{Deserialize, Serialize};
use std::time::Duration;
use tiller_control::{control, ControlConfig};
use tiller_state::Controllable;

#[derive(Debug, Clone, Serialize, Deserialize, Controllable)]
struct Head {
    activation: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Controllable)]
struct Model {
    hidden_dim: Vec<u32>,
    #[control(nested)]
    head: Head,
}

#[derive(Debug, Clone, Serialize, Deserialize, Controllable)]
struct Checkpoints {
    every_epochs: u32,
    save_dir: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Controllable)]
struct TrainState {
    training_stopped: bool,
    lr: f64,
    #[control(nested)]
    checkpoints: Checkpoints,
    #[control(nested)]
    model: Model,
}

fn epoch_loop(config: &TrainState, current_epoch: u32) {
    // training our great model here
    std::thread::sleep(Duration::from_secs(5));

    if config.checkpoints.every_epochs > 0 && current_epoch % config.checkpoints.every_epochs == 0
    {
        println!(
            "Saving checkpoint after epoch {current_epoch} to {}",
            config.checkpoints.save_dir
        );
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let state = TrainState {
        training_stopped: false,
        lr: 1e-3,
        checkpoints: Checkpoints {
            every_epochs: 2,
            save_dir: "checkpoints".into(),
        },
        model: Model {
            hidden_dim: vec![128, 256, 512],
            head: Head {
                activation: "relu".into(),
            },
        },
    };

    let mut controller = control(&state, ControlConfig::default()).expect("start control server");
    println!(
        "Controlling training state on http://{}",
        controller.local_addr().expect("bound address")
    );

    let mut current_epoch = 0;
    loop {
        let config: TrainState = controller.state().expect("read live state");
        if config.training_stopped {
            break;
        }
        println!("epoch {current_epoch}: lr={}", config.lr);
        epoch_loop(&config, current_epoch);
        current_epoch += 1;
    }

    println!("Training stopped!");
    controller.stop().expect("stop control server");
}
