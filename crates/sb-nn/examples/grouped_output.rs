// SPDX-License-Identifier: AGPL-3.0-or-later
// © 2025 Ryo ∴ SpiralArchitect (kishkavsesvit@icloud.com)
// Part of SpiralBind — Licensed under AGPL-3.0-or-later.
// Unauthorized derivative works or closed redistribution prohibited under AGPL §13.

use sb_nn::{LogisticCrossEntropy, Loss, Module, PortDims, Softmax, Tensor, WiringContext};
use std::error::Error;

fn main() -> Result<(), Box<dyn Error>> {
    sb_config::init_tracing()?;
    let flags = *sb_config::flags::config();

    // Two target instances, each with two classes.
    let mut loss = LogisticCrossEntropy::new();
    let ctx = WiringContext::output(2).with_target(loss.target());
    let mut node = Softmax::new(1)?;
    let mut dims = PortDims::new(node.ports()).with("X", 4)?;
    let mut wired = node.wire(&ctx, &mut dims)?;

    let logits = Tensor::from_vec(2, 4, vec![1.0, 2.0, 0.5, -0.5, 3.0, 3.0, -1.0, 4.0])?;
    let target = Tensor::from_vec(2, 4, vec![0.0, 1.0, 1.0, 0.0, 1.0, 0.0, 0.0, 1.0])?;
    let probs = wired.forward(&logits, &flags)?;
    let value = loss.forward(&probs, &target)?;
    let grad = wired.backward(&loss.backward(&probs, &target)?)?;

    tracing::info!(mode = ?wired.mode(), loss = value.data()[0], "evaluated output node");
    for r in 0..probs.shape().0 {
        println!(
            "probs[{r}] = {:?}  grad[{r}] = {:?}",
            probs.row(r).unwrap_or_default(),
            grad.row(r).unwrap_or_default()
        );
    }
    Ok(())
}
