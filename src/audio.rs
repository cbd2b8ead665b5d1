use stormlines_core::{AudioEngine, AudioError, AudioParam, AudioResult, FilterKind, Waveform};
use wasm_bindgen::JsValue;
use web_sys as web;

/// Web Audio node handles, tagged by capability.
#[derive(Clone)]
pub enum WebNode {
    Gain(web::GainNode),
    Filter(web::BiquadFilterNode),
    Panner(web::StereoPannerNode),
    Oscillator(web::OscillatorNode),
    Destination(web::AudioDestinationNode),
}

impl WebNode {
    fn kind(&self) -> &'static str {
        match self {
            WebNode::Gain(_) => "gain",
            WebNode::Filter(_) => "filter",
            WebNode::Panner(_) => "panner",
            WebNode::Oscillator(_) => "oscillator",
            WebNode::Destination(_) => "destination",
        }
    }

    fn audio_node(&self) -> &web::AudioNode {
        match self {
            WebNode::Gain(n) => AsRef::<web::AudioNode>::as_ref(n),
            WebNode::Filter(n) => AsRef::<web::AudioNode>::as_ref(n),
            WebNode::Panner(n) => AsRef::<web::AudioNode>::as_ref(n),
            WebNode::Oscillator(n) => AsRef::<web::AudioNode>::as_ref(n),
            WebNode::Destination(n) => AsRef::<web::AudioNode>::as_ref(n),
        }
    }

    fn param(&self, param: AudioParam) -> AudioResult<web::AudioParam> {
        let p = match (self, param) {
            (WebNode::Gain(n), AudioParam::Gain) => n.gain(),
            (WebNode::Filter(n), AudioParam::Frequency) => n.frequency(),
            (WebNode::Filter(n), AudioParam::Q) => n.q(),
            (WebNode::Filter(n), AudioParam::Detune) => n.detune(),
            (WebNode::Panner(n), AudioParam::Pan) => n.pan(),
            (WebNode::Oscillator(n), AudioParam::Frequency) => n.frequency(),
            (WebNode::Oscillator(n), AudioParam::Detune) => n.detune(),
            _ => {
                return Err(AudioError::UnknownParam {
                    node: self.kind(),
                    param,
                })
            }
        };
        Ok(p)
    }
}

fn js_reason(e: JsValue) -> String {
    format!("{:?}", e)
}

fn create_err(kind: &'static str) -> impl FnOnce(JsValue) -> AudioError {
    move |e| {
        log::error!("{} node error: {:?}", kind, e);
        AudioError::Create {
            kind,
            reason: js_reason(e),
        }
    }
}

/// [`AudioEngine`] over a browser `AudioContext`.
pub struct WebAudio {
    ctx: web::AudioContext,
}

impl WebAudio {
    pub fn new() -> anyhow::Result<Self> {
        let ctx = web::AudioContext::new().map_err(|e| anyhow::anyhow!("{:?}", e))?;
        Ok(Self { ctx })
    }

    pub fn context(&self) -> &web::AudioContext {
        &self.ctx
    }
}

impl AudioEngine for WebAudio {
    type Node = WebNode;

    fn current_time(&self) -> f64 {
        self.ctx.current_time()
    }

    fn destination(&self) -> WebNode {
        WebNode::Destination(self.ctx.destination())
    }

    fn create_gain(&self, value: f32) -> AudioResult<WebNode> {
        let g = web::GainNode::new(&self.ctx).map_err(create_err("gain"))?;
        g.gain().set_value(value);
        Ok(WebNode::Gain(g))
    }

    fn create_filter(&self, kind: FilterKind, frequency: f32, q: f32) -> AudioResult<WebNode> {
        let f = web::BiquadFilterNode::new(&self.ctx).map_err(create_err("filter"))?;
        f.set_type(match kind {
            FilterKind::Lowpass => web::BiquadFilterType::Lowpass,
            FilterKind::Highpass => web::BiquadFilterType::Highpass,
        });
        f.frequency().set_value(frequency);
        f.q().set_value(q);
        Ok(WebNode::Filter(f))
    }

    fn create_stereo_panner(&self, pan: f32) -> AudioResult<WebNode> {
        let p = web::StereoPannerNode::new(&self.ctx).map_err(create_err("panner"))?;
        p.pan().set_value(pan);
        Ok(WebNode::Panner(p))
    }

    fn create_oscillator(
        &self,
        waveform: Waveform,
        frequency: f32,
        detune: f32,
    ) -> AudioResult<WebNode> {
        let o = web::OscillatorNode::new(&self.ctx).map_err(create_err("oscillator"))?;
        o.set_type(match waveform {
            Waveform::Sine => web::OscillatorType::Sine,
            Waveform::Square => web::OscillatorType::Square,
            Waveform::Sawtooth => web::OscillatorType::Sawtooth,
            Waveform::Triangle => web::OscillatorType::Triangle,
        });
        o.frequency().set_value(frequency);
        o.detune().set_value(detune);
        Ok(WebNode::Oscillator(o))
    }

    fn connect(&self, from: &WebNode, to: &WebNode) -> AudioResult<()> {
        from.audio_node()
            .connect_with_audio_node(to.audio_node())
            .map(|_| ())
            .map_err(|e| AudioError::Connect(js_reason(e)))
    }

    fn connect_param(&self, from: &WebNode, to: &WebNode, param: AudioParam) -> AudioResult<()> {
        let target = to.param(param)?;
        from.audio_node()
            .connect_with_audio_param(&target)
            .map_err(|e| AudioError::Connect(js_reason(e)))
    }

    fn disconnect(&self, node: &WebNode) {
        _ = node.audio_node().disconnect();
    }

    fn set_param(&self, node: &WebNode, param: AudioParam, value: f32) -> AudioResult<()> {
        node.param(param)?.set_value(value);
        Ok(())
    }

    fn exponential_ramp(
        &self,
        node: &WebNode,
        param: AudioParam,
        value: f32,
        end_time: f64,
    ) -> AudioResult<()> {
        node.param(param)?
            .exponential_ramp_to_value_at_time(value, end_time)
            .map(|_| ())
            .map_err(|e| AudioError::Schedule {
                param,
                reason: js_reason(e),
            })
    }

    fn start(&self, oscillator: &WebNode) -> AudioResult<()> {
        match oscillator {
            WebNode::Oscillator(o) => AsRef::<web::AudioScheduledSourceNode>::as_ref(o)
                .start()
                .map_err(|e| AudioError::Start(js_reason(e))),
            other => Err(AudioError::Start(format!("{} is not a source", other.kind()))),
        }
    }

    fn stop(&self, oscillator: &WebNode) {
        if let WebNode::Oscillator(o) = oscillator {
            // Throws if the node was never started; nothing to undo then.
            _ = AsRef::<web::AudioScheduledSourceNode>::as_ref(o).stop();
        }
    }
}
