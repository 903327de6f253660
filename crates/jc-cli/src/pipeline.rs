//! Per-event processing chain and cutflow bookkeeping.
//!
//! Order per event: luminosity mask (data), energy-scale re-correction,
//! resolution smearing (simulation), veto-map flags, channel selection.

use anyhow::Result;
use jc_core::geometry::abs_delta_phi_between;
use jc_core::{Event, Jet, Lepton};
use jc_correct::{CorrectionEngine, event_stream, match_gen_jet, smear_hybrid, stream_rng};
use jc_mask::{LumiMask, VetoMap};
use jc_select::config::SelectionConfig;
use jc_select::zjet::LeptonFlavor;
use jc_select::{Channel, dijet, found, multijet, photonjet, zjet};
use rand::Rng;
use rayon::prelude::*;
use serde::Serialize;

use crate::run::RunConfig;

/// Everything loaded once before the parallel phase.
///
/// The pipeline owns its worker pool; worker `k` reads correction slot `k`, and
/// the pool is sized to the slot count.
#[derive(Debug)]
pub struct Pipeline {
    pool: rayon::ThreadPool,
    channel: Channel,
    is_mc: bool,
    seed: u64,
    jet_cone: f64,
    cuts: SelectionConfig,
    engine: Option<CorrectionEngine>,
    lumi_mask: Option<LumiMask>,
    veto_map: Option<VetoMap>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CutflowEntry {
    pub stage: &'static str,
    pub pass: u64,
}

/// Running pass counts, carried across event chunks.
#[derive(Debug, Clone)]
pub struct Cutflow {
    stages: Vec<&'static str>,
    counts: Vec<u64>,
    n_events: u64,
}

impl Cutflow {
    /// Events processed so far; also the index of the next event.
    pub fn n_events(&self) -> u64 {
        self.n_events
    }

    /// `(stage, pass)` pairs in stage order.
    pub fn entries(&self) -> Vec<CutflowEntry> {
        self.stages
            .iter()
            .zip(&self.counts)
            .map(|(&stage, &pass)| CutflowEntry { stage, pass })
            .collect()
    }
}

fn channel_stages(channel: Channel) -> &'static [&'static str] {
    match channel {
        Channel::Dijet => &["tag_probe", "jets_not_vetoed"],
        Channel::Multijet => &["recoil", "leading_pt", "forward_near_veto"],
        Channel::Photonjet => &["photon_tag", "probe"],
        Channel::Zee | Channel::Zmm => &["lepton_pair", "trigger_match", "leading_jet"],
    }
}

impl Pipeline {
    /// Load masks and build the correction registry with `n_threads` slots.
    pub fn from_config(cfg: &RunConfig, n_threads: usize) -> Result<Self> {
        let engine = match &cfg.jec {
            Some(jec) => {
                let engine = CorrectionEngine::init_jec(jec, n_threads)?;
                match (&cfg.jer, cfg.is_mc) {
                    (Some(jer), true) => Some(engine.with_jer(jer)?),
                    (Some(_), false) => {
                        tracing::warn!("jer configured for collision data; smearing disabled");
                        Some(engine)
                    }
                    (None, _) => Some(engine),
                }
            }
            None => None,
        };
        let lumi_mask = match (&cfg.lumi_mask, cfg.is_mc) {
            (Some(path), false) => Some(LumiMask::from_path(path)?),
            _ => None,
        };
        let veto_map = cfg.veto_map.as_ref().map(VetoMap::from_path).transpose()?;
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(n_threads)
            .build()
            .map_err(|e| anyhow::anyhow!("failed to create thread pool: {e}"))?;

        Ok(Self {
            pool,
            channel: cfg.channel,
            is_mc: cfg.is_mc,
            seed: cfg.seed,
            jet_cone: cfg.jet_cone,
            cuts: cfg.cuts.clone(),
            engine,
            lumi_mask,
            veto_map,
        })
    }

    pub fn engine(&self) -> Option<&CorrectionEngine> {
        self.engine.as_ref()
    }

    /// Worker count of the pipeline pool.
    pub fn n_threads(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Cutflow stage names in order; the first is always `all`.
    pub fn stages(&self) -> Vec<&'static str> {
        let mut stages = vec!["all"];
        if self.lumi_mask.is_some() {
            stages.push("golden_json");
        }
        stages.extend_from_slice(channel_stages(self.channel));
        stages
    }

    /// Number of cutflow stages `event` passes (at least 1).
    pub fn process(&self, slot: usize, index: u64, event: &Event) -> Result<usize> {
        let mut passed = 1;
        if let Some(mask) = &self.lumi_mask {
            if !mask.is_good_lumi(event.scalars.run, event.scalars.lumi) {
                return Ok(passed);
            }
            passed += 1;
        }

        let rho = event.scalars.rho;
        let mut rng = stream_rng(self.seed, event_stream(event.scalars.run, index));
        let mut jets = match &self.engine {
            Some(engine) => engine.corrected_jets(slot, &event.jets, rho),
            None => event.jets.clone(),
        };
        if self.is_mc
            && let Some(engine) = &self.engine
            && engine.has_resolution()
        {
            self.smear_jets(engine, slot, &mut jets, event, &mut rng)?;
        }
        let not_vetoed = match &self.veto_map {
            Some(map) => map.pass_flags(&jets),
            None => vec![true; jets.len()],
        };

        let channel_passed = match self.channel {
            Channel::Dijet => self.dijet(&jets, &not_vetoed, &mut rng),
            Channel::Multijet => self.multijet(&jets),
            Channel::Photonjet => self.photonjet(&jets, &not_vetoed, event),
            Channel::Zee => self.zjet(&jets, &not_vetoed, &event.electrons, event, LeptonFlavor::Electron),
            Channel::Zmm => self.zjet(&jets, &not_vetoed, &event.muons, event, LeptonFlavor::Muon),
        };
        Ok(passed + channel_passed)
    }

    fn smear_jets<R: Rng>(
        &self,
        engine: &CorrectionEngine,
        slot: usize,
        jets: &mut [Jet],
        event: &Event,
        rng: &mut R,
    ) -> Result<()> {
        let rho = event.scalars.rho;
        for jet in jets.iter_mut() {
            let sigma = engine.resolution(slot, jet.pt, jet.eta, rho)?;
            let sf = if engine.has_scale_factor() {
                engine.resolution_scale_factor(slot, jet.pt, jet.eta, rho)?
            } else {
                1.0
            };
            let gen_pt = match_gen_jet(jet, sigma, &event.gen_jets, self.jet_cone).map(|g| g.pt);
            let factor = smear_hybrid(jet.pt, sigma, sf, gen_pt, rng);
            let raw_pt = jet.raw_pt();
            jet.pt *= factor;
            jet.mass *= factor;
            if jet.pt > 0.0 {
                jet.raw_factor = 1.0 - raw_pt / jet.pt;
            }
        }
        Ok(())
    }

    fn dijet<R: Rng>(&self, jets: &[Jet], not_vetoed: &[bool], rng: &mut R) -> usize {
        let sel = dijet::find_tag_probe_idxs(jets, &self.cuts.dijet, rng);
        let (Some(tag), Some(probe)) = (found(sel.tag), found(sel.probe)) else {
            return 0;
        };
        if !(not_vetoed[tag] && not_vetoed[probe]) {
            return 1;
        }
        2
    }

    fn multijet(&self, jets: &[Jet]) -> usize {
        let cuts = &self.cuts.multijet;
        let sel = multijet::select_multijet(jets, cuts);
        if sel.recoil.is_empty() {
            return 0;
        }
        if !jets.first().is_some_and(|j| j.pt > cuts.min_pt) {
            return 1;
        }
        if !sel.is_clean() {
            return 2;
        }
        3
    }

    fn photonjet(&self, jets: &[Jet], not_vetoed: &[bool], event: &Event) -> usize {
        let cuts = &self.cuts.photonjet;
        let matched = photonjet::has_trigger_object(&event.photons, &event.trigger_objects, cuts);
        let tag = event.photons.iter().zip(&matched).find(|(_, m)| **m).map(|(ph, _)| ph);
        let Some(tag) = tag.filter(|t| t.pt > cuts.tag_min_pt && t.eta.abs() < cuts.tag_max_abs_eta)
        else {
            return 0;
        };
        let pair = photonjet::find_jet_idxs(jets, &event.photons, cuts);
        let probe_ok = found(pair.probe).is_some_and(|p| {
            let jet = &jets[p];
            jet.pt > cuts.probe_min_pt
                && abs_delta_phi_between(jet, tag) > cuts.min_back_to_back_dphi
                && jet.passes_id(cuts.min_jet_id)
                && not_vetoed[p]
        });
        if probe_ok { 2 } else { 1 }
    }

    fn zjet(
        &self,
        jets: &[Jet],
        not_vetoed: &[bool],
        leptons: &[Lepton],
        event: &Event,
        flavor: LeptonFlavor,
    ) -> usize {
        let cuts = &self.cuts.zjet;
        let pair = zjet::find_lepton_pair(leptons, cuts);
        if !pair.is_found() {
            return 0;
        }
        let selected = pair.leptons(leptons);
        let matched = zjet::has_trigger_object(&selected, &event.trigger_objects, flavor, cuts);
        if !matched.iter().any(|&m| m) {
            return 1;
        }
        let (lead, _) = zjet::find_jet_idxs(jets, &selected, cuts);
        if found(lead).is_some_and(|j| not_vetoed[j]) { 3 } else { 2 }
    }

    /// Empty cutflow over [`Pipeline::stages`].
    pub fn cutflow(&self) -> Cutflow {
        let stages = self.stages();
        let counts = vec![0; stages.len()];
        Cutflow { stages, counts, n_events: 0 }
    }

    /// Process one chunk of consecutive events and add its passes to `cutflow`.
    ///
    /// Event indices continue from `cutflow.n_events()`, so splitting a stream
    /// into chunks does not change any random stream. Work runs on the pipeline
    /// pool whatever pool the caller is on.
    pub fn run_chunk(&self, events: &[Event], cutflow: &mut Cutflow) -> Result<()> {
        let first = cutflow.n_events;
        let n_slots = self.engine.as_ref().map_or(self.n_threads(), CorrectionEngine::n_threads);
        let outcomes = self.pool.install(|| {
            events
                .par_iter()
                .enumerate()
                .map(|(i, ev)| {
                    let slot = rayon::current_thread_index().unwrap_or(0);
                    if slot >= n_slots {
                        anyhow::bail!("worker {slot} has no correction slot ({n_slots} built)");
                    }
                    self.process(slot, first + i as u64, ev)
                })
                .collect::<Result<Vec<_>>>()
        })?;

        for n in outcomes {
            for c in cutflow.counts.iter_mut().take(n) {
                *c += 1;
            }
        }
        cutflow.n_events += events.len() as u64;
        Ok(())
    }

    /// Process `events` as a single chunk.
    #[cfg(test)]
    pub fn run(&self, events: &[Event]) -> Result<Vec<CutflowEntry>> {
        let mut cutflow = self.cutflow();
        self.run_chunk(events, &mut cutflow)?;
        Ok(cutflow.entries())
    }
}
