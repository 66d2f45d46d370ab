//! GPT-2 decoder built from `candle-nn` layers.
//!
//! Weight names follow the Hugging Face checkpoint layout (`wte`, `wpe`,
//! `h.{i}.attn.c_attn`, ...). Projections use the Conv1D convention, where the
//! weight is stored as `[in, out]`. The language-model head is tied to `wte`.

use candle_core::{DType, Device, Module, Tensor, D};
use candle_nn::{embedding, layer_norm, Embedding, LayerNorm, VarBuilder};
use serde::Deserialize;

use crate::Result;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "RawGpt2Config")]
pub struct Gpt2Config {
    pub vocab_size: usize,
    pub n_positions: usize,
    pub n_embd: usize,
    pub n_layer: usize,
    pub n_head: usize,
    pub layer_norm_epsilon: f64,
    pub eos_token_id: Option<u32>,
}

fn default_layer_norm_epsilon() -> f64 {
    1e-5
}

/// Hub configs carry both `n_positions` and the older `n_ctx`; either may be
/// the only one present.
#[derive(Deserialize)]
struct RawGpt2Config {
    vocab_size: usize,
    n_positions: Option<usize>,
    n_ctx: Option<usize>,
    n_embd: usize,
    n_layer: usize,
    n_head: usize,
    #[serde(default = "default_layer_norm_epsilon")]
    layer_norm_epsilon: f64,
    #[serde(default)]
    eos_token_id: Option<u32>,
}

impl From<RawGpt2Config> for Gpt2Config {
    fn from(raw: RawGpt2Config) -> Self {
        Self {
            vocab_size: raw.vocab_size,
            n_positions: raw.n_positions.or(raw.n_ctx).unwrap_or(1024),
            n_embd: raw.n_embd,
            n_layer: raw.n_layer,
            n_head: raw.n_head,
            layer_norm_epsilon: raw.layer_norm_epsilon,
            eos_token_id: raw.eos_token_id,
        }
    }
}

impl Gpt2Config {
    pub fn head_dim(&self) -> usize {
        self.n_embd / self.n_head
    }
}

/// Linear projection with a `[in, out]` weight.
#[derive(Debug, Clone)]
struct Conv1D {
    weight: Tensor,
    bias: Tensor,
}

impl Conv1D {
    fn load(in_dim: usize, out_dim: usize, vb: VarBuilder) -> Result<Self> {
        let weight = vb.get_with_hints(
            (in_dim, out_dim),
            "weight",
            candle_nn::init::DEFAULT_KAIMING_NORMAL,
        )?;
        let bias = vb.get_with_hints(out_dim, "bias", candle_nn::Init::Const(0.))?;
        Ok(Self { weight, bias })
    }
}

impl Module for Conv1D {
    fn forward(&self, xs: &Tensor) -> candle_core::Result<Tensor> {
        xs.broadcast_matmul(&self.weight)?.broadcast_add(&self.bias)
    }
}

/// Cached keys and values for one layer, shaped `[batch, heads, seq, head_dim]`.
pub type LayerCache = Option<(Tensor, Tensor)>;

/// Per-request attention cache. Owned by the caller so the model itself stays
/// immutable and shareable.
#[derive(Debug, Clone)]
pub struct Gpt2Cache {
    layers: Vec<LayerCache>,
}

impl Gpt2Cache {
    pub fn new(n_layer: usize) -> Self {
        Self {
            layers: vec![None; n_layer],
        }
    }

    /// Number of positions already held in the cache.
    pub fn seq_len(&self) -> usize {
        self.layers
            .first()
            .and_then(|layer| layer.as_ref())
            .and_then(|(k, _)| k.dim(2).ok())
            .unwrap_or(0)
    }
}

#[derive(Debug, Clone)]
struct Attention {
    c_attn: Conv1D,
    c_proj: Conv1D,
    n_head: usize,
    head_dim: usize,
}

impl Attention {
    fn load(config: &Gpt2Config, vb: VarBuilder) -> Result<Self> {
        let n_embd = config.n_embd;
        Ok(Self {
            c_attn: Conv1D::load(n_embd, 3 * n_embd, vb.pp("c_attn"))?,
            c_proj: Conv1D::load(n_embd, n_embd, vb.pp("c_proj"))?,
            n_head: config.n_head,
            head_dim: config.head_dim(),
        })
    }

    fn split_heads(&self, xs: &Tensor, b: usize, t: usize) -> candle_core::Result<Tensor> {
        xs.reshape((b, t, self.n_head, self.head_dim))?
            .transpose(1, 2)?
            .contiguous()
    }

    fn forward(
        &self,
        xs: &Tensor,
        mask: Option<&Tensor>,
        cache: &mut LayerCache,
    ) -> candle_core::Result<Tensor> {
        let (b, t, c) = xs.dims3()?;
        let qkv = self.c_attn.forward(xs)?;
        let q = self.split_heads(&qkv.narrow(D::Minus1, 0, c)?, b, t)?;
        let k = self.split_heads(&qkv.narrow(D::Minus1, c, c)?, b, t)?;
        let v = self.split_heads(&qkv.narrow(D::Minus1, 2 * c, c)?, b, t)?;

        let (k, v) = match cache.take() {
            Some((past_k, past_v)) => (
                Tensor::cat(&[&past_k, &k], 2)?,
                Tensor::cat(&[&past_v, &v], 2)?,
            ),
            None => (k, v),
        };
        *cache = Some((k.clone(), v.clone()));

        let scale = 1.0 / (self.head_dim as f64).sqrt();
        let scores = q.matmul(&k.t()?.contiguous()?)?.affine(scale, 0.)?;
        let scores = match mask {
            Some(mask) => scores.broadcast_add(mask)?,
            None => scores,
        };
        let weights = candle_nn::ops::softmax_last_dim(&scores)?;
        let ys = weights
            .matmul(&v)?
            .transpose(1, 2)?
            .contiguous()?
            .reshape((b, t, c))?;
        self.c_proj.forward(&ys)
    }
}

#[derive(Debug, Clone)]
struct Mlp {
    c_fc: Conv1D,
    c_proj: Conv1D,
}

impl Mlp {
    fn load(config: &Gpt2Config, vb: VarBuilder) -> Result<Self> {
        let n_embd = config.n_embd;
        Ok(Self {
            c_fc: Conv1D::load(n_embd, 4 * n_embd, vb.pp("c_fc"))?,
            c_proj: Conv1D::load(4 * n_embd, n_embd, vb.pp("c_proj"))?,
        })
    }
}

impl Module for Mlp {
    fn forward(&self, xs: &Tensor) -> candle_core::Result<Tensor> {
        // gelu() is the tanh approximation GPT-2 was trained with.
        self.c_proj.forward(&self.c_fc.forward(xs)?.gelu()?)
    }
}

#[derive(Debug, Clone)]
struct Block {
    ln_1: LayerNorm,
    attn: Attention,
    ln_2: LayerNorm,
    mlp: Mlp,
}

impl Block {
    fn load(config: &Gpt2Config, vb: VarBuilder) -> Result<Self> {
        let eps = config.layer_norm_epsilon;
        Ok(Self {
            ln_1: layer_norm(config.n_embd, eps, vb.pp("ln_1"))?,
            attn: Attention::load(config, vb.pp("attn"))?,
            ln_2: layer_norm(config.n_embd, eps, vb.pp("ln_2"))?,
            mlp: Mlp::load(config, vb.pp("mlp"))?,
        })
    }

    fn forward(
        &self,
        xs: &Tensor,
        mask: Option<&Tensor>,
        cache: &mut LayerCache,
    ) -> candle_core::Result<Tensor> {
        let attn = self.attn.forward(&self.ln_1.forward(xs)?, mask, cache)?;
        let xs = (xs + attn)?;
        let mlp = self.mlp.forward(&self.ln_2.forward(&xs)?)?;
        xs + mlp
    }
}

#[derive(Debug, Clone)]
pub struct Gpt2Model {
    wte: Embedding,
    wpe: Embedding,
    blocks: Vec<Block>,
    ln_f: LayerNorm,
    config: Gpt2Config,
    device: Device,
}

impl Gpt2Model {
    /// Builds the model from `vb`. Checkpoints written by `save_pretrained`
    /// nest everything under `transformer.`; the bare Hub layout does not.
    pub fn load(config: &Gpt2Config, vb: VarBuilder) -> Result<Self> {
        let vb = if vb.contains_tensor("transformer.wte.weight") {
            vb.pp("transformer")
        } else {
            vb
        };

        let wte = embedding(config.vocab_size, config.n_embd, vb.pp("wte"))?;
        let wpe = embedding(config.n_positions, config.n_embd, vb.pp("wpe"))?;
        let blocks = (0..config.n_layer)
            .map(|i| Block::load(config, vb.pp(format!("h.{i}"))))
            .collect::<Result<Vec<_>>>()?;
        let ln_f = layer_norm(config.n_embd, config.layer_norm_epsilon, vb.pp("ln_f"))?;

        Ok(Self {
            wte,
            wpe,
            blocks,
            ln_f,
            config: config.clone(),
            device: vb.device().clone(),
        })
    }

    pub fn config(&self) -> &Gpt2Config {
        &self.config
    }

    pub fn device(&self) -> &Device {
        &self.device
    }

    pub fn new_cache(&self) -> Gpt2Cache {
        Gpt2Cache::new(self.config.n_layer)
    }

    /// Runs `input_ids` (`[1, seq]`) after whatever `cache` already holds and
    /// returns the logits for the last position as a `[vocab]` tensor.
    pub fn forward(&self, input_ids: &Tensor, cache: &mut Gpt2Cache) -> Result<Tensor> {
        let (_b, t) = input_ids.dims2()?;
        let past = cache.seq_len();

        let positions = Tensor::arange(past as u32, (past + t) as u32, &self.device)?;
        let mut xs = self
            .wte
            .forward(input_ids)?
            .broadcast_add(&self.wpe.forward(&positions)?)?;

        let mask = if t > 1 {
            Some(causal_mask(t, past, &self.device)?)
        } else {
            None
        };

        for (block, layer_cache) in self.blocks.iter().zip(cache.layers.iter_mut()) {
            xs = block.forward(&xs, mask.as_ref(), layer_cache)?;
        }

        let last = self.ln_f.forward(&xs)?.narrow(1, t - 1, 1)?.squeeze(1)?;
        let logits = last.matmul(&self.wte.embeddings().t()?)?;
        Ok(logits.squeeze(0)?.to_dtype(DType::F32)?)
    }
}

/// Additive mask letting query `i` attend to keys `0..=past + i`.
fn causal_mask(t: usize, past: usize, device: &Device) -> Result<Tensor> {
    let width = past + t;
    let mask: Vec<f32> = (0..t)
        .flat_map(|i| {
            (0..width).map(move |j| if j <= past + i { 0.0 } else { f32::NEG_INFINITY })
        })
        .collect();
    Ok(Tensor::from_slice(&mask, (t, width), device)?)
}
