// SPDX-License-Identifier: LGPL-3.0-or-later
// Copyright (c) 2022 Takashi Sakamoto

//! A framework for AV/C transaction defined by 1394 Trading Association, with the subset of
//! general and CCM commands required to operate the supported units.

pub mod ccm;
pub mod general;
