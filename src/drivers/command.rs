use std::fmt;
/// Button groups on the control panel.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CommandGroup {
    Zero,
    Gain,
    SampleRate,
    Input,
    Bootloader,
}
/// Every action the device understands. Each maps to a literal payload that is
/// written verbatim, with no framing and no acknowledgement.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DeviceCommand {
    Zero,
    Gain1,
    Gain2,
    Gain4,
    Gain8,
    Gain16,
    Sps25,
    Sps50,
    Sps100,
    Input1,
    Input2,
    Bootloader,
}
impl DeviceCommand {
    pub const ALL: [DeviceCommand; 12] = [
        DeviceCommand::Zero,
        DeviceCommand::Gain1,
        DeviceCommand::Gain2,
        DeviceCommand::Gain4,
        DeviceCommand::Gain8,
        DeviceCommand::Gain16,
        DeviceCommand::Sps25,
        DeviceCommand::Sps50,
        DeviceCommand::Sps100,
        DeviceCommand::Input1,
        DeviceCommand::Input2,
        DeviceCommand::Bootloader,
    ];
    pub fn payload(self) -> &'static str {
        match self {
            DeviceCommand::Zero => "z",
            DeviceCommand::Gain1 => "1",
            DeviceCommand::Gain2 => "2",
            DeviceCommand::Gain4 => "4",
            DeviceCommand::Gain8 => "8",
            DeviceCommand::Gain16 => "16",
            DeviceCommand::Sps25 => "a",
            DeviceCommand::Sps50 => "b",
            DeviceCommand::Sps100 => "c",
            DeviceCommand::Input1 => "x",
            DeviceCommand::Input2 => "y",
            DeviceCommand::Bootloader => "r",
        }
    }
    /// Inverse of [`payload`](Self::payload), used by the simulated device.
    pub fn from_payload(payload: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.payload() == payload)
    }
    pub fn label(self) -> &'static str {
        match self {
            DeviceCommand::Zero => "Zero",
            DeviceCommand::Gain1 => "x1",
            DeviceCommand::Gain2 => "x2",
            DeviceCommand::Gain4 => "x4",
            DeviceCommand::Gain8 => "x8",
            DeviceCommand::Gain16 => "x16",
            DeviceCommand::Sps25 => "25 SPS",
            DeviceCommand::Sps50 => "50 SPS",
            DeviceCommand::Sps100 => "100 SPS",
            DeviceCommand::Input1 => "Input 1",
            DeviceCommand::Input2 => "Input 2",
            DeviceCommand::Bootloader => "Bootloader",
        }
    }
    pub fn group(self) -> CommandGroup {
        match self {
            DeviceCommand::Zero => CommandGroup::Zero,
            DeviceCommand::Gain1
            | DeviceCommand::Gain2
            | DeviceCommand::Gain4
            | DeviceCommand::Gain8
            | DeviceCommand::Gain16 => CommandGroup::Gain,
            DeviceCommand::Sps25 | DeviceCommand::Sps50 | DeviceCommand::Sps100 => {
                CommandGroup::SampleRate
            }
            DeviceCommand::Input1 | DeviceCommand::Input2 => CommandGroup::Input,
            DeviceCommand::Bootloader => CommandGroup::Bootloader,
        }
    }
    pub fn in_group(group: CommandGroup) -> impl Iterator<Item = DeviceCommand> {
        Self::ALL.into_iter().filter(move |c| c.group() == group)
    }
}
impl fmt::Display for DeviceCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({:?})", self.label(), self.payload())
    }
}
