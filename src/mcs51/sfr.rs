//! Special-function register map.
//!
//! Every `REG_*` constant is an index into the 128-byte SFR bank, i.e. the
//! architectural address minus 0x80. The classic 8051/8052 registers come
//! first, followed by the CH55x extensions.

use bitflags::bitflags;

pub const REG_P0: u8 = 0x80 - 0x80;
pub const REG_SP: u8 = 0x81 - 0x80;
pub const REG_DPL: u8 = 0x82 - 0x80;
pub const REG_DPH: u8 = 0x83 - 0x80;
pub const REG_PCON: u8 = 0x87 - 0x80;
pub const REG_TCON: u8 = 0x88 - 0x80;
pub const REG_TMOD: u8 = 0x89 - 0x80;
pub const REG_TL0: u8 = 0x8A - 0x80;
pub const REG_TL1: u8 = 0x8B - 0x80;
pub const REG_TH0: u8 = 0x8C - 0x80;
pub const REG_TH1: u8 = 0x8D - 0x80;
pub const REG_P1: u8 = 0x90 - 0x80;
pub const REG_SCON: u8 = 0x98 - 0x80;
pub const REG_SBUF: u8 = 0x99 - 0x80;
pub const REG_P2: u8 = 0xA0 - 0x80;
pub const REG_IE: u8 = 0xA8 - 0x80;
pub const REG_P3: u8 = 0xB0 - 0x80;
pub const REG_IP: u8 = 0xB8 - 0x80;
pub const REG_T2CON: u8 = 0xC8 - 0x80;
pub const REG_T2MOD: u8 = 0xC9 - 0x80;
pub const REG_RCAP2L: u8 = 0xCA - 0x80;
pub const REG_RCAP2H: u8 = 0xCB - 0x80;
pub const REG_TL2: u8 = 0xCC - 0x80;
pub const REG_TH2: u8 = 0xCD - 0x80;
pub const REG_PSW: u8 = 0xD0 - 0x80;
pub const REG_ACC: u8 = 0xE0 - 0x80;
pub const REG_B: u8 = 0xF0 - 0x80;

// CH55x extensions
pub const REG_ROM_ADDR_L: u8 = 0x84 - 0x80;
pub const REG_ROM_ADDR_H: u8 = 0x85 - 0x80;
pub const REG_ROM_CTRL: u8 = 0x86 - 0x80;
pub const REG_ROM_DATA_L: u8 = 0x8E - 0x80;
pub const REG_ROM_DATA_H: u8 = 0x8F - 0x80;
pub const REG_USB_C_CTRL: u8 = 0x91 - 0x80;
pub const REG_P1_MOD_OC: u8 = 0x92 - 0x80;
pub const REG_P1_DIR_PU: u8 = 0x93 - 0x80;
pub const REG_P3_MOD_OC: u8 = 0x96 - 0x80;
pub const REG_P3_DIR_PU: u8 = 0x97 - 0x80;
pub const REG_ADC_CFG: u8 = 0x9A - 0x80;
pub const REG_PWM_DATA2: u8 = 0x9B - 0x80;
pub const REG_PWM_DATA1: u8 = 0x9C - 0x80;
pub const REG_PWM_CTRL: u8 = 0x9D - 0x80;
pub const REG_PWM_CK_SE: u8 = 0x9E - 0x80;
pub const REG_ADC_DATA: u8 = 0x9F - 0x80;
pub const REG_SAFE_MOD: u8 = 0xA1 - 0x80;
pub const REG_XBUS_AUX: u8 = 0xA2 - 0x80;
pub const REG_WAKE_CTRL: u8 = 0xA9 - 0x80;
pub const REG_DPLX: u8 = 0xAE - 0x80;
pub const REG_DPHX: u8 = 0xAF - 0x80;
pub const REG_GLOBAL_CFG: u8 = 0xB1 - 0x80;
pub const REG_CLOCK_CFG: u8 = 0xB9 - 0x80;
pub const REG_SCON1: u8 = 0xC0 - 0x80;
pub const REG_SBUF1: u8 = 0xC1 - 0x80;
pub const REG_SBAUD1: u8 = 0xC2 - 0x80;
pub const REG_TKEY_CTRL: u8 = 0xC3 - 0x80;
pub const REG_TKEY_DATL: u8 = 0xC4 - 0x80;
pub const REG_TKEY_DATH: u8 = 0xC5 - 0x80;
pub const REG_PIN_FUNC: u8 = 0xC6 - 0x80;
pub const REG_GPIO_IE: u8 = 0xC7 - 0x80;
pub const REG_T2CAP1L: u8 = 0xCE - 0x80;
pub const REG_T2CAP1H: u8 = 0xCF - 0x80;
pub const REG_UDEV_CTRL: u8 = 0xD1 - 0x80;
pub const REG_UEP1_CTRL: u8 = 0xD2 - 0x80;
pub const REG_UEP1_T_LEN: u8 = 0xD3 - 0x80;
pub const REG_UEP2_CTRL: u8 = 0xD4 - 0x80;
pub const REG_UEP2_T_LEN: u8 = 0xD5 - 0x80;
pub const REG_UEP3_CTRL: u8 = 0xD6 - 0x80;
pub const REG_UEP3_T_LEN: u8 = 0xD7 - 0x80;
pub const REG_USB_INT_FG: u8 = 0xD8 - 0x80;
pub const REG_USB_INT_ST: u8 = 0xD9 - 0x80;
pub const REG_USB_MIS_ST: u8 = 0xDA - 0x80;
pub const REG_USB_RX_LEN: u8 = 0xDB - 0x80;
pub const REG_UEP0_CTRL: u8 = 0xDC - 0x80;
pub const REG_UEP0_T_LEN: u8 = 0xDD - 0x80;
pub const REG_UEP4_CTRL: u8 = 0xDE - 0x80;
pub const REG_UEP4_T_LEN: u8 = 0xDF - 0x80;
pub const REG_USB_INT_EN: u8 = 0xE1 - 0x80;
pub const REG_USB_CTRL: u8 = 0xE2 - 0x80;
pub const REG_USB_DEV_AD: u8 = 0xE3 - 0x80;
pub const REG_UEP2_DMA_L: u8 = 0xE4 - 0x80;
pub const REG_UEP2_DMA_H: u8 = 0xE5 - 0x80;
pub const REG_UEP3_DMA_L: u8 = 0xE6 - 0x80;
pub const REG_UEP3_DMA_H: u8 = 0xE7 - 0x80;
pub const REG_IE_EX: u8 = 0xE8 - 0x80;
pub const REG_IP_EX: u8 = 0xE9 - 0x80;
pub const REG_UEP4_1_MOD: u8 = 0xEA - 0x80;
pub const REG_UEP2_3_MOD: u8 = 0xEB - 0x80;
pub const REG_UEP0_DMA_L: u8 = 0xEC - 0x80;
pub const REG_UEP0_DMA_H: u8 = 0xED - 0x80;
pub const REG_UEP1_DMA_L: u8 = 0xEE - 0x80;
pub const REG_UEP1_DMA_H: u8 = 0xEF - 0x80;
pub const REG_SPI0_STAT: u8 = 0xF8 - 0x80;
pub const REG_SPI0_DATA: u8 = 0xF9 - 0x80;
pub const REG_SPI0_CTRL: u8 = 0xFA - 0x80;
pub const REG_SPI0_CK_SE: u8 = 0xFB - 0x80;
pub const REG_SPI0_SETUP: u8 = 0xFC - 0x80;
pub const REG_RESET_KEEP: u8 = 0xFE - 0x80;
pub const REG_WDOG_COUNT: u8 = 0xFF - 0x80;

/// Assembler name of the SFR at bank index `register`, if it has one.
pub fn name(register: u8) -> Option<&'static str> {
    let name = match register {
        REG_P0 => "P0",
        REG_SP => "SP",
        REG_DPL => "DPL",
        REG_DPH => "DPH",
        REG_ROM_ADDR_L => "ROM_ADDR_L",
        REG_ROM_ADDR_H => "ROM_ADDR_H",
        REG_ROM_CTRL => "ROM_CTRL",
        REG_PCON => "PCON",
        REG_TCON => "TCON",
        REG_TMOD => "TMOD",
        REG_TL0 => "TL0",
        REG_TL1 => "TL1",
        REG_TH0 => "TH0",
        REG_TH1 => "TH1",
        REG_ROM_DATA_L => "ROM_DATA_L",
        REG_ROM_DATA_H => "ROM_DATA_H",
        REG_P1 => "P1",
        REG_USB_C_CTRL => "USB_C_CTRL",
        REG_P1_MOD_OC => "P1_MOD_OC",
        REG_P1_DIR_PU => "P1_DIR_PU",
        REG_P3_MOD_OC => "P3_MOD_OC",
        REG_P3_DIR_PU => "P3_DIR_PU",
        REG_SCON => "SCON",
        REG_SBUF => "SBUF",
        REG_ADC_CFG => "ADC_CFG",
        REG_PWM_DATA2 => "PWM_DATA2",
        REG_PWM_DATA1 => "PWM_DATA1",
        REG_PWM_CTRL => "PWM_CTRL",
        REG_PWM_CK_SE => "PWM_CK_SE",
        REG_ADC_DATA => "ADC_DATA",
        REG_P2 => "P2",
        REG_SAFE_MOD => "SAFE_MOD",
        REG_XBUS_AUX => "XBUS_AUX",
        REG_IE => "IE",
        REG_WAKE_CTRL => "WAKE_CTRL",
        REG_DPLX => "DPLX",
        REG_DPHX => "DPHX",
        REG_P3 => "P3",
        REG_GLOBAL_CFG => "GLOBAL_CFG",
        REG_IP => "IP",
        REG_CLOCK_CFG => "CLOCK_CFG",
        REG_SCON1 => "SCON1",
        REG_SBUF1 => "SBUF1",
        REG_SBAUD1 => "SBAUD1",
        REG_TKEY_CTRL => "TKEY_CTRL",
        REG_TKEY_DATL => "TKEY_DATL",
        REG_TKEY_DATH => "TKEY_DATH",
        REG_PIN_FUNC => "PIN_FUNC",
        REG_GPIO_IE => "GPIO_IE",
        REG_T2CON => "T2CON",
        REG_T2MOD => "T2MOD",
        REG_RCAP2L => "RCAP2L",
        REG_RCAP2H => "RCAP2H",
        REG_TL2 => "TL2",
        REG_TH2 => "TH2",
        REG_T2CAP1L => "T2CAP1L",
        REG_T2CAP1H => "T2CAP1H",
        REG_PSW => "PSW",
        REG_UDEV_CTRL => "UDEV_CTRL",
        REG_UEP1_CTRL => "UEP1_CTRL",
        REG_UEP1_T_LEN => "UEP1_T_LEN",
        REG_UEP2_CTRL => "UEP2_CTRL",
        REG_UEP2_T_LEN => "UEP2_T_LEN",
        REG_UEP3_CTRL => "UEP3_CTRL",
        REG_UEP3_T_LEN => "UEP3_T_LEN",
        REG_USB_INT_FG => "USB_INT_FG",
        REG_USB_INT_ST => "USB_INT_ST",
        REG_USB_MIS_ST => "USB_MIS_ST",
        REG_USB_RX_LEN => "USB_RX_LEN",
        REG_UEP0_CTRL => "UEP0_CTRL",
        REG_UEP0_T_LEN => "UEP0_T_LEN",
        REG_UEP4_CTRL => "UEP4_CTRL",
        REG_UEP4_T_LEN => "UEP4_T_LEN",
        REG_ACC => "ACC",
        REG_USB_INT_EN => "USB_INT_EN",
        REG_USB_CTRL => "USB_CTRL",
        REG_USB_DEV_AD => "USB_DEV_AD",
        REG_UEP2_DMA_L => "UEP2_DMA_L",
        REG_UEP2_DMA_H => "UEP2_DMA_H",
        REG_UEP3_DMA_L => "UEP3_DMA_L",
        REG_UEP3_DMA_H => "UEP3_DMA_H",
        REG_IE_EX => "IE_EX",
        REG_IP_EX => "IP_EX",
        REG_UEP4_1_MOD => "UEP4_1_MOD",
        REG_UEP2_3_MOD => "UEP2_3_MOD",
        REG_UEP0_DMA_L => "UEP0_DMA_L",
        REG_UEP0_DMA_H => "UEP0_DMA_H",
        REG_UEP1_DMA_L => "UEP1_DMA_L",
        REG_UEP1_DMA_H => "UEP1_DMA_H",
        REG_B => "B",
        REG_SPI0_STAT => "SPI0_STAT",
        REG_SPI0_DATA => "SPI0_DATA",
        REG_SPI0_CTRL => "SPI0_CTRL",
        REG_SPI0_CK_SE => "SPI0_CK_SE",
        REG_SPI0_SETUP => "SPI0_SETUP",
        REG_RESET_KEEP => "RESET_KEEP",
        REG_WDOG_COUNT => "WDOG_COUNT",
        _ => return None,
    };
    Some(name)
}

bitflags! {
    pub struct PSW: u8 {
        const P   = 0b00000001;
        const F1  = 0b00000010;
        const OV  = 0b00000100;
        const RS0 = 0b00001000;
        const RS1 = 0b00010000;
        const F0  = 0b00100000;
        const AC  = 0b01000000;
        const CY  = 0b10000000;
    }

    pub struct IE: u8 {
        const EX0 = 0b00000001;
        const ET0 = 0b00000010;
        const EX1 = 0b00000100;
        const ET1 = 0b00001000;
        const ES  = 0b00010000;
        const ET2 = 0b00100000;
        const EA  = 0b10000000;
    }

    pub struct IP: u8 {
        const PX0 = 0b00000001;
        const PT0 = 0b00000010;
        const PX1 = 0b00000100;
        const PT1 = 0b00001000;
        const PS  = 0b00010000;
        const PT2 = 0b00100000;
    }

    pub struct TCON: u8 {
        const IT0 = 0b00000001;
        const IE0 = 0b00000010;
        const IT1 = 0b00000100;
        const IE1 = 0b00001000;
        const TR0 = 0b00010000;
        const TF0 = 0b00100000;
        const TR1 = 0b01000000;
        const TF1 = 0b10000000;
    }

    pub struct TMOD: u8 {
        const T0_M0 =   0b00000001;
        const T0_M1 =   0b00000010;
        const T0_CT =   0b00000100;
        const T0_GATE = 0b00001000;
        const T1_M0 =   0b00010000;
        const T1_M1 =   0b00100000;
        const T1_CT =   0b01000000;
        const T1_GATE = 0b10000000;
    }

    pub struct SCON: u8 {
        const RI  = 0b00000001;
        const TI  = 0b00000010;
        const RB8 = 0b00000100;
        const TB8 = 0b00001000;
        const REN = 0b00010000;
        const SM2 = 0b00100000;
        const SM1 = 0b01000000;
        const SM0 = 0b10000000;
    }

    pub struct T2CON: u8 {
        const CP_RL2 = 0b00000001;
        const C_T2   = 0b00000010;
        const TR2    = 0b00000100;
        const EXEN2  = 0b00001000;
        const TCLK   = 0b00010000;
        const RCLK   = 0b00100000;
        const EXF2   = 0b01000000;
        const TF2    = 0b10000000;
    }
}

/// PSW bits that an interrupt service routine must hand back unchanged.
/// Parity follows the accumulator; F0 and F1 belong to the firmware.
pub const PSW_PRESERVED: PSW = PSW::from_bits_truncate(
    PSW::CY.bits() | PSW::AC.bits() | PSW::OV.bits() | PSW::RS1.bits() | PSW::RS0.bits(),
);
