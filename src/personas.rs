//! Persona registry: fixed rotating progress messages per persona.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Presentation profile selecting which rotating progress messages are shown
/// while a repair is in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Persona {
    Hacker,
    DarkHumor,
    Corporate,
}

const HACKER_MESSAGES: &[&str] = &[
    "💻 Initiating breach protocol…",
    "🛰️ Uplink established to satellite cluster…",
    "🔓 Bypassing syntax firewalls…",
    "📡 Intercepting stray semicolons…",
    "🧨 Injecting zero-day patches…",
    "💾 Downloading compiler intel from Area 51…",
    "🛸 Negotiating indentation treaties…",
    "🕵️ Writing unit tests behind your back…",
    "🚁 Deploying tactical recursion drones…",
    "⚡ Overclocking logic units to unsafe levels…",
    "🔐 Decrypting indentation anomaly…",
    "🎯 Target acquired: your broken syntax…",
];

const DARK_HUMOR_MESSAGES: &[&str] = &[
    "💀 Your code died. Performing autopsy…",
    "🧨 Found bug. Placed C4. Step back.",
    "🧯 Putting out the dumpster fire…",
    "😈 Introducing new bugs for company…",
    "🪦 Rest in peace, missing parenthesis…",
    "🫠 Melting spaghetti logic…",
    "🎢 Emotional damage detected. Stabilizing…",
    "🤡 Removing clown logic…",
    "☠️ Your code just flatlined at line 4…",
    "🩸 Bleeding out exceptions everywhere…",
    "⚰️ Preparing funeral for your functions…",
    "👻 Haunted by ghost variables…",
];

const CORPORATE_MESSAGES: &[&str] = &[
    "📈 Forwarding bugs to upper management…",
    "📊 Selling bug patterns to advertisers…",
    "💼 Performance review: your code failed…",
    "📉 Reducing quality for quarterly forecasts…",
    "🔗 Auditing indentation for tax evasion…",
    "📦 Packaging mistakes as premium subscription…",
    "💸 Converting bugs into billable hours…",
    "🔒 Encrypting code and charging for the key…",
    "💰 Monetizing your runtime errors…",
    "📋 Filing TPS report on your syntax…",
    "🏆 Your bugs exceed shareholder expectations…",
    "⚖️ Escalating to Premium Fixing Department…",
];

impl Persona {
    /// Ordered, non-empty message rotation for this persona.
    pub fn messages(self) -> &'static [&'static str] {
        match self {
            Persona::Hacker => HACKER_MESSAGES,
            Persona::DarkHumor => DARK_HUMOR_MESSAGES,
            Persona::Corporate => CORPORATE_MESSAGES,
        }
    }
}
