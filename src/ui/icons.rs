pub struct Icons;

impl Icons {
    pub const ROCKET: &str = "🚀";
    pub const CHECK: &str = "✅";
    pub const CROSS: &str = "❌";
    pub const WARN: &str = "⚠️";
    pub const INFO: &str = "ℹ️";
    pub const STATS: &str = "📊";
    pub const LINK: &str = "🔗";
    pub const FOLDER: &str = "📁";
    pub const MOD: &str = "📝";
    pub const MAG: &str = "🔎";
    pub const GEAR: &str = "⚙️";
}
