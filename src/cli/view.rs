//! View command implementation

use anyhow::{Result, bail};

use renderlens::config::Config;
use renderlens::viewer::{LayerFilter, TextSink, ViewController, ViewUpdate};

/// Navigation requested on the command line
pub struct ViewRequest {
    pub sequence: String,
    pub shot: Option<String>,
    pub layer: Option<String>,
    pub history: Option<String>,
    pub stat: Option<String>,
}

/// Load a sequence, drill down as requested and print the resulting view
pub async fn view_command(config: &Config, request: ViewRequest) -> Result<()> {
    let mut controller = ViewController::from_config(config)?.with_progress(|done, total| {
        eprint!("\rDownloading render data {}/{}", done, total);
        if done == total {
            eprintln!();
        }
    });
    let mut sink = TextSink::new(std::io::stdout());
    let mut notices = Vec::new();

    if let Some(stat) = &request.stat {
        notices.extend(controller.set_stat(stat).notices);
    }

    notices.extend(controller.select_sequence(&request.sequence).await.notices);
    if controller.nav().sequence() != Some(request.sequence.as_str()) {
        for notice in &notices {
            eprintln!("{}", notice);
        }
        bail!("Could not load render data for {}", request.sequence);
    }

    if let Some(shot) = &request.shot {
        notices.extend(controller.enter_shot(shot).notices);
    }
    if let Some(layer) = &request.layer {
        let filter = LayerFilter::from_menu(layer);
        notices.extend(controller.set_layer(filter).await.notices);
    }
    if let Some(history) = &request.history {
        notices.extend(controller.set_history(history).await.notices);
    }

    let update = ViewUpdate {
        notices,
        ..Default::default()
    };
    controller.present(&update, &mut sink);
    Ok(())
}
